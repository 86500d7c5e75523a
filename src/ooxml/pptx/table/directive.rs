//! Caller input: what to write into a row.
use crate::ooxml::pptx::table::background::BackgroundPicture;
use std::collections::HashSet;

/// Replace `tag` with `new_text`; when the tag matched, optionally give the cell a
/// picture background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellDirective {
    tag: String,
    new_text: String,
    picture: Option<BackgroundPicture>,
}

impl CellDirective {
    pub fn new(tag: impl Into<String>, new_text: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            new_text: new_text.into(),
            picture: None,
        }
    }

    pub fn with_picture(mut self, picture: BackgroundPicture) -> Self {
        self.picture = Some(picture);
        self
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn new_text(&self) -> &str {
        &self.new_text
    }

    #[inline]
    pub fn picture(&self) -> Option<&BackgroundPicture> {
        self.picture.as_ref()
    }
}

/// One record: directives applied in order to every cell of a template row.
///
/// When several directives share a tag, the last one wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalRow {
    directives: Vec<CellDirective>,
}

impl LogicalRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, directive: CellDirective) -> Self {
        self.directives.push(directive);
        self
    }

    pub fn push(&mut self, directive: CellDirective) {
        self.directives.push(directive);
    }

    #[inline]
    pub fn directives(&self) -> &[CellDirective] {
        &self.directives
    }

    /// Directives that take effect, in row order: a directive is skipped when a
    /// later one in the row has the same tag, so only the last one for each tag
    /// is applied (its picture included).
    pub fn effective_directives(&self) -> Vec<&CellDirective> {
        let mut seen = HashSet::with_capacity(self.directives.len());
        let mut effective: Vec<&CellDirective> = self
            .directives
            .iter()
            .rev()
            .filter(|d| seen.insert(d.tag.as_str()))
            .collect();
        effective.reverse();
        effective
    }

    /// First tag that appears more than once, if any.
    pub fn duplicate_tag(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.directives.len());
        self.directives
            .iter()
            .map(|d| d.tag.as_str())
            .find(|tag| !seen.insert(*tag))
    }
}

impl FromIterator<CellDirective> for LogicalRow {
    fn from_iter<I: IntoIterator<Item = CellDirective>>(iter: I) -> Self {
        Self {
            directives: iter.into_iter().collect(),
        }
    }
}

impl<T: Into<String>, U: Into<String>> FromIterator<(T, U)> for LogicalRow {
    fn from_iter<I: IntoIterator<Item = (T, U)>>(iter: I) -> Self {
        iter.into_iter()
            .map(|(tag, text)| CellDirective::new(tag, text))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_tag() {
        let row: LogicalRow = [("{a}", "1"), ("{b}", "2")].into_iter().collect();
        assert_eq!(row.duplicate_tag(), None);

        let row = row.with(CellDirective::new("{a}", "3"));
        assert_eq!(row.duplicate_tag(), Some("{a}"));
        assert_eq!(row.directives().len(), 3);

        let effective: Vec<&str> = row.effective_directives().iter().map(|d| d.new_text()).collect();
        assert_eq!(effective, ["2", "3"]);
    }
}

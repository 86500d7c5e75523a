/// Paragraphs and text runs inside a table cell.
///
/// A DrawingML paragraph (`a:p`) is a sequence of runs (`a:r`), line breaks
/// (`a:br`) and fields (`a:fld`). Runs are modelled so their text can be
/// rewritten; everything else is carried through as XML.
use crate::ooxml::xml::{XmlElement, XmlNode};

/// A text run: optional run properties plus its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    properties: Option<XmlElement>,
    text: String,
}

impl TextRun {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            properties: None,
            text: text.into(),
        }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// The `a:rPr` block, if any.
    #[inline]
    pub fn properties(&self) -> Option<&XmlElement> {
        self.properties.as_ref()
    }
}

/// Paragraph content in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(TextRun),
    Break(XmlElement),
    /// Fields and anything else; contributes text but is never rewritten.
    Other(XmlElement),
}

/// A paragraph (`a:p`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    shell: XmlElement,
    properties: Option<XmlElement>,
    content: Vec<Inline>,
    end_properties: Option<XmlElement>,
}

impl Paragraph {
    /// A paragraph holding a single unformatted run.
    pub fn with_text(text: &str) -> Self {
        Self {
            shell: XmlElement::new("a:p"),
            properties: None,
            content: vec![Inline::Run(TextRun::new(text))],
            end_properties: None,
        }
    }

    pub(crate) fn from_element(element: &XmlElement) -> Self {
        let mut paragraph = Self {
            shell: element.shallow_clone(),
            properties: None,
            content: Vec::new(),
            end_properties: None,
        };

        for child in element.elements() {
            match child.local_name() {
                "pPr" => paragraph.properties = Some(child.clone()),
                "endParaRPr" => paragraph.end_properties = Some(child.clone()),
                "r" => paragraph.content.push(Inline::Run(TextRun {
                    properties: child.child("rPr").cloned(),
                    text: child.child("t").map(element_text).unwrap_or_default(),
                })),
                "br" => paragraph.content.push(Inline::Break(child.clone())),
                _ => paragraph.content.push(Inline::Other(child.clone())),
            }
        }

        paragraph
    }

    pub(crate) fn to_element(&self) -> XmlElement {
        let mut element = self.shell.clone();
        if let Some(props) = &self.properties {
            element.push(props.clone());
        }
        for inline in &self.content {
            match inline {
                Inline::Run(run) => {
                    let mut r = XmlElement::new(self.shell.qualify("r"));
                    if let Some(props) = &run.properties {
                        r.push(props.clone());
                    }
                    let mut t = XmlElement::new(self.shell.qualify("t"));
                    if !run.text.is_empty() {
                        t.push_text(&run.text);
                    }
                    r.push(t);
                    element.push(r);
                },
                Inline::Break(el) | Inline::Other(el) => element.push(el.clone()),
            }
        }
        if let Some(props) = &self.end_properties {
            element.push(props.clone());
        }
        element
    }

    #[inline]
    pub fn content(&self) -> &[Inline] {
        &self.content
    }

    /// Iterate over the text runs.
    pub fn runs(&self) -> impl Iterator<Item = &TextRun> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(run) => Some(run),
            _ => None,
        })
    }

    /// Plain text of the paragraph. Line breaks become `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for inline in &self.content {
            match inline {
                Inline::Run(run) => text.push_str(&run.text),
                Inline::Break(_) => text.push('\n'),
                Inline::Other(el) => {
                    if let Some(t) = el.child("t") {
                        text.push_str(&element_text(t));
                    }
                },
            }
        }
        text
    }

    /// Replace every occurrence of `tag` with `new_text`.
    ///
    /// A tag may be split across adjacent runs (editors often do this when a
    /// placeholder was typed in pieces). The replacement inherits the formatting of
    /// the run where the tag starts; covered characters are removed from the
    /// following runs. Breaks and fields end a run sequence, so a tag never
    /// matches across them.
    ///
    /// Returns true iff at least one occurrence was replaced. An empty tag never
    /// matches.
    pub fn replace_tag(&mut self, tag: &str, new_text: &str) -> bool {
        if tag.is_empty() {
            return false;
        }

        let mut replaced = false;
        let mut start = 0;
        while start < self.content.len() {
            if !matches!(self.content[start], Inline::Run(_)) {
                start += 1;
                continue;
            }
            let mut end = start;
            while end < self.content.len() && matches!(self.content[end], Inline::Run(_)) {
                end += 1;
            }
            replaced |= replace_in_runs(&mut self.content[start..end], tag, new_text);
            start = end;
        }
        replaced
    }
}

/// Replace within a slice made only of `Inline::Run`s.
fn replace_in_runs(runs: &mut [Inline], tag: &str, new_text: &str) -> bool {
    let finder = memchr::memmem::Finder::new(tag.as_bytes());
    let mut replaced = false;
    let mut from = 0;

    loop {
        let combined: String = runs
            .iter()
            .filter_map(|inline| match inline {
                Inline::Run(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect();
        let Some(pos) = finder.find(&combined.as_bytes()[from..]) else {
            break;
        };
        let tag_start = from + pos;
        let tag_end = tag_start + tag.len();

        let mut offset = 0;
        let mut first = true;
        for inline in runs.iter_mut() {
            let Inline::Run(run) = inline else {
                continue;
            };
            let run_start = offset;
            let run_end = offset + run.text.len();
            offset = run_end;

            if run_end <= tag_start || run_start >= tag_end {
                continue;
            }
            let local_start = tag_start.saturating_sub(run_start);
            let local_end = tag_end.min(run_end) - run_start;
            if first {
                run.text.replace_range(local_start..local_end, new_text);
                first = false;
            } else {
                run.text.replace_range(local_start..local_end, "");
            }
        }

        replaced = true;
        from = tag_start + new_text.len();
    }

    replaced
}

/// Concatenated text content of an element (`a:t`).
fn element_text(element: &XmlElement) -> String {
    let mut text = String::new();
    for node in element.children() {
        match node {
            XmlNode::Text(t) | XmlNode::CData(t) => text.push_str(t),
            _ => {},
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xml::XmlDocument;

    fn paragraph(xml: &str) -> Paragraph {
        let doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        Paragraph::from_element(doc.root())
    }

    #[test]
    fn test_text_extraction() {
        let p = paragraph(
            r#"<a:p xmlns:a="urn:a"><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US"/><a:t>Hello </a:t></a:r><a:r><a:t>World</a:t></a:r><a:br/><a:fld id="{1}" type="slidenum"><a:t>3</a:t></a:fld><a:endParaRPr/></a:p>"#,
        );
        assert_eq!(p.text(), "Hello World\n3");
        assert_eq!(p.runs().count(), 2);
    }

    #[test]
    fn test_replace_within_single_run() {
        let mut p = paragraph(r#"<a:p xmlns:a="urn:a"><a:r><a:t>Name: {name}!</a:t></a:r></a:p>"#);
        assert!(p.replace_tag("{name}", "Ada"));
        assert_eq!(p.text(), "Name: Ada!");
    }

    #[test]
    fn test_replace_tag_split_across_runs() {
        let mut p = paragraph(
            r#"<a:p xmlns:a="urn:a"><a:r><a:rPr b="1"/><a:t>x{na</a:t></a:r><a:r><a:t>me</a:t></a:r><a:r><a:t>}y</a:t></a:r></a:p>"#,
        );
        assert!(p.replace_tag("{name}", "Ada"));
        assert_eq!(p.text(), "xAday");

        let runs: Vec<&TextRun> = p.runs().collect();
        assert_eq!(runs[0].text(), "xAda");
        assert!(runs[0].properties().is_some());
        assert_eq!(runs[1].text(), "");
        assert_eq!(runs[2].text(), "y");
    }

    #[test]
    fn test_replace_every_occurrence() {
        let mut p = paragraph(r#"<a:p xmlns:a="urn:a"><a:r><a:t>{x}-{x}</a:t></a:r></a:p>"#);
        assert!(p.replace_tag("{x}", "1"));
        assert_eq!(p.text(), "1-1");
    }

    #[test]
    fn test_replacement_containing_tag_terminates() {
        let mut p = paragraph(r#"<a:p xmlns:a="urn:a"><a:r><a:t>{x}</a:t></a:r></a:p>"#);
        assert!(p.replace_tag("{x}", "{x}{x}"));
        assert_eq!(p.text(), "{x}{x}");
    }

    #[test]
    fn test_no_match_leaves_text_unchanged() {
        let mut p = paragraph(r#"<a:p xmlns:a="urn:a"><a:r><a:t>plain</a:t></a:r></a:p>"#);
        let before = p.clone();
        assert!(!p.replace_tag("{missing}", "value"));
        assert!(!p.replace_tag("", "value"));
        assert_eq!(p, before);
    }

    #[test]
    fn test_tag_does_not_span_break() {
        let mut p = paragraph(
            r#"<a:p xmlns:a="urn:a"><a:r><a:t>{na</a:t></a:r><a:br/><a:r><a:t>me}</a:t></a:r></a:p>"#,
        );
        assert!(!p.replace_tag("{name}", "Ada"));
    }

    #[test]
    fn test_round_trip_keeps_properties() {
        let xml = r#"<a:p xmlns:a="urn:a"><a:pPr algn="ctr"/><a:r><a:rPr lang="en-US"/><a:t>A &amp; B</a:t></a:r><a:br/><a:endParaRPr lang="en-US"/></a:p>"#;
        let p = paragraph(xml);
        let written = p.to_element().to_xml();
        assert_eq!(written, xml);
    }

    #[test]
    fn test_unicode_tag() {
        let mut p = paragraph(r#"<a:p xmlns:a="urn:a"><a:r><a:t>«città»</a:t></a:r></a:p>"#);
        assert!(p.replace_tag("«città»", "Zürich"));
        assert_eq!(p.text(), "Zürich");
    }
}

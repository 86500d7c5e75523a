//! Options controlling how rows are filled.
use serde::{Deserialize, Serialize};

/// What to do when one logical row carries several directives with the same tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTagPolicy {
    /// Only the last directive for each tag is applied. Earlier ones with the same
    /// tag are skipped, pictures included.
    #[default]
    LastApplies,
    /// Refuse the rows before any slide is cloned.
    Reject,
}

/// How background pictures become image resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEmbedding {
    /// Embed a new resource for every attachment.
    #[default]
    PerAttachment,
    /// Reuse one resource for identical bytes on the same slide.
    ReuseIdentical,
}

/// Options for [`SlideTable`](super::SlideTable).
///
/// # Examples
///
/// ```
/// use slidefill::{DuplicateTagPolicy, FillOptions};
///
/// let options = FillOptions {
///     duplicate_tags: DuplicateTagPolicy::Reject,
///     ..Default::default()
/// };
/// assert_eq!(options.duplicate_tags, DuplicateTagPolicy::Reject);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FillOptions {
    pub duplicate_tags: DuplicateTagPolicy,
    pub images: ImageEmbedding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_preserve_plain_behavior() {
        let options = FillOptions::default();
        assert_eq!(options.duplicate_tags, DuplicateTagPolicy::LastApplies);
        assert_eq!(options.images, ImageEmbedding::PerAttachment);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: FillOptions = serde_json::from_str(r#"{"images":"reuse_identical"}"#).unwrap();
        assert_eq!(options.images, ImageEmbedding::ReuseIdentical);
        assert_eq!(options.duplicate_tags, DuplicateTagPolicy::LastApplies);

        let json = serde_json::to_string(&FillOptions::default()).unwrap();
        assert_eq!(json, r#"{"duplicate_tags":"last_applies","images":"per_attachment"}"#);
    }
}

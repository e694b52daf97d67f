//! Turning remote mailbox names into local tags.

/// Maps a raw name to a tag, or `None` when nothing usable remains.
pub trait TagNormalizer: Send + Sync {
    /// Normalizes `raw` into a tag.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Characters dropped from tags outright.
const STRIPPED: &str = "/?#[]@!$&'()*+,;=.%\\`^|{}\"<>";

/// Lowercase, dash-separated tags of bounded length.
///
/// ```
/// use flagsync_core::tagging::{CleanTag, TagNormalizer};
///
/// let tags = CleanTag::new(20);
/// assert_eq!(tags.normalize("  Work / Clients ").as_deref(), Some("work-clients"));
/// assert_eq!(tags.normalize("[Gmail]").as_deref(), Some("gmail"));
/// assert_eq!(tags.normalize("???"), None);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CleanTag {
    max_length: usize,
}

impl CleanTag {
    /// Creates a normalizer that truncates to `max_length` characters.
    #[must_use]
    pub const fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Default for CleanTag {
    fn default() -> Self {
        Self::new(20)
    }
}

impl TagNormalizer for CleanTag {
    fn normalize(&self, raw: &str) -> Option<String> {
        let mut tag = String::with_capacity(raw.len());
        let mut separate = false;

        for c in raw.trim().to_lowercase().chars() {
            if c.is_whitespace() || c == '-' {
                separate = true;
            } else if !STRIPPED.contains(c) {
                if separate && !tag.is_empty() {
                    tag.push('-');
                }
                separate = false;
                tag.push(c);
            }
        }

        let mut tag: String = tag.chars().take(self.max_length).collect();
        while tag.ends_with('-') {
            tag.pop();
        }
        (!tag.is_empty()).then_some(tag)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn separators_collapse_to_single_dashes() {
        let tags = CleanTag::default();
        assert_eq!(tags.normalize("a  --  b").as_deref(), Some("a-b"));
        assert_eq!(tags.normalize("--lead and trail--").as_deref(), Some("lead-and-trail"));
        assert_eq!(tags.normalize("tab\tseparated").as_deref(), Some("tab-separated"));
    }

    #[test]
    fn punctuation_is_dropped_not_replaced() {
        let tags = CleanTag::default();
        assert_eq!(tags.normalize("Q3.Reports!").as_deref(), Some("q3reports"));
        assert_eq!(tags.normalize("[Gmail]/Sent Mail").as_deref(), Some("gmailsent-mail"));
        assert_eq!(tags.normalize("INBOX").as_deref(), Some("inbox"));
    }

    #[test]
    fn truncation_does_not_leave_a_trailing_dash() {
        let tags = CleanTag::new(4);
        assert_eq!(tags.normalize("abc def").as_deref(), Some("abc"));
        assert_eq!(tags.normalize("abcdefgh").as_deref(), Some("abcd"));
    }

    #[test]
    fn empty_results_are_none() {
        let tags = CleanTag::default();
        assert_eq!(tags.normalize(""), None);
        assert_eq!(tags.normalize("   "), None);
        assert_eq!(tags.normalize("[]/()"), None);
        assert_eq!(tags.normalize(" - "), None);
    }

    proptest! {
        #[test]
        fn output_is_well_formed(raw in "[ -~\t]{0,60}", max in 1usize..30) {
            if let Some(tag) = CleanTag::new(max).normalize(&raw) {
                prop_assert!(!tag.is_empty());
                prop_assert!(tag.chars().count() <= max);
                prop_assert!(!tag.starts_with('-') && !tag.ends_with('-'));
                prop_assert!(!tag.contains("--"));
                prop_assert!(!tag.chars().any(|c| c.is_whitespace() || STRIPPED.contains(c)));
                prop_assert!(!tag.chars().any(|c| c.is_ascii_uppercase()));
            }
        }

        #[test]
        fn normalizing_twice_changes_nothing(raw in "[ -~]{0,60}") {
            let tags = CleanTag::default();
            if let Some(tag) = tags.normalize(&raw) {
                prop_assert_eq!(tags.normalize(&tag), Some(tag));
            }
        }
    }
}

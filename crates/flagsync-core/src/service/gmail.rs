//! Gmail dialect.
//!
//! Gmail exposes labels as mailboxes under `[Gmail]/` (or `[Google Mail]/`
//! in some locales) and as the `X-GM-LABELS` message attribute. Archiving
//! is just dropping `\Inbox` from that attribute.

use flagsync_imap::StoreAction;

use super::{MailService, ServiceKind};
use crate::tagging::TagNormalizer;

const SYSTEM_PREFIXES: [&str; 2] = ["[Gmail]/", "[Google Mail]/"];

/// Gmail with the `X-GM-EXT-1` extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct Gmail;

impl Gmail {
    /// Attribute holding a message's labels.
    pub const LABELS: &'static str = "X-GM-LABELS";
}

impl MailService for Gmail {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Gmail
    }

    fn mailbox_to_label(&self, name: &str, normalizer: &dyn TagNormalizer) -> Option<String> {
        let local = SYSTEM_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
            .unwrap_or(name);
        normalizer.normalize(local)
    }

    fn tag_to_flag(&self, tag: &str) -> Option<&'static str> {
        match tag {
            "seen" => Some("\\Seen"),
            "starred" => Some("\\Flagged"),
            _ => None,
        }
    }

    fn tag_to_label(&self, tag: &str) -> String {
        match tag {
            "important" => "\\Important".to_string(),
            "starred" => "\\Starred".to_string(),
            "inbox" => "\\Inbox".to_string(),
            other => other.to_string(),
        }
    }

    fn label_attribute(&self) -> Option<&'static str> {
        Some(Self::LABELS)
    }

    fn archive_action(&self) -> Option<StoreAction> {
        Some(StoreAction::remove(Self::LABELS, vec!["\\Inbox".to_string()]))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use flagsync_imap::StoreMode;

    use super::*;
    use crate::tagging::CleanTag;

    #[test]
    fn system_prefix_is_stripped_before_normalizing() {
        let tags = CleanTag::default();
        assert_eq!(Gmail.mailbox_to_label("[Gmail]/Sent Mail", &tags).as_deref(), Some("sent-mail"));
        assert_eq!(Gmail.mailbox_to_label("[Google Mail]/Spam", &tags).as_deref(), Some("spam"));
        assert_eq!(Gmail.mailbox_to_label("Receipts", &tags).as_deref(), Some("receipts"));
        assert_eq!(Gmail.mailbox_to_label("[Gmail]", &tags).as_deref(), Some("gmail"));
    }

    #[test]
    fn stars_map_to_flag_and_label() {
        assert_eq!(Gmail.tag_to_flag("starred"), Some("\\Flagged"));
        assert_eq!(Gmail.tag_to_flag("seen"), Some("\\Seen"));
        assert_eq!(Gmail.tag_to_flag("important"), None);
        assert_eq!(Gmail.tag_to_label("starred"), "\\Starred");
        assert_eq!(Gmail.tag_to_label("important"), "\\Important");
        assert_eq!(Gmail.tag_to_label("inbox"), "\\Inbox");
        assert_eq!(Gmail.tag_to_label("receipts"), "receipts");
    }

    #[test]
    fn archive_removes_inbox_label() {
        let action = Gmail.archive_action().unwrap();
        assert_eq!(action.mode, StoreMode::Remove);
        assert_eq!(action.attribute, "X-GM-LABELS");
        assert_eq!(action.values, vec!["\\Inbox".to_string()]);
        assert_eq!(Gmail.label_attribute(), Some("X-GM-LABELS"));
    }
}

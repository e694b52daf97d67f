//! Mail-service dialects.
//!
//! Servers agree on IMAP but not on how labels, stars and archiving map
//! onto it. A [`MailService`] captures those choices; [`Generic`] is plain
//! IMAP and [`Gmail`] speaks the `X-GM-EXT-1` extension.

mod gmail;

use serde::{Deserialize, Serialize};

use flagsync_imap::StoreAction;

pub use gmail::Gmail;

use crate::tagging::TagNormalizer;

/// Per-service mapping between local tags and remote mailboxes, flags and
/// labels.
pub trait MailService: Send + Sync + std::fmt::Debug {
    /// Which dialect this is.
    fn kind(&self) -> ServiceKind;

    /// Derives a tag from a remote mailbox name.
    fn mailbox_to_label(&self, name: &str, normalizer: &dyn TagNormalizer) -> Option<String> {
        normalizer.normalize(name)
    }

    /// System flag that stands for `tag`, if any.
    fn tag_to_flag(&self, tag: &str) -> Option<&'static str> {
        (tag == "seen").then_some("\\Seen")
    }

    /// Remote label that stands for `tag`.
    fn tag_to_label(&self, tag: &str) -> String {
        tag.to_string()
    }

    /// FETCH/STORE attribute that carries labels, when the service has one.
    fn label_attribute(&self) -> Option<&'static str> {
        None
    }

    /// Store that archives a message. `None` means archiving needs no
    /// server change.
    fn archive_action(&self) -> Option<StoreAction> {
        None
    }
}

/// Plain IMAP.
#[derive(Debug, Clone, Copy, Default)]
pub struct Generic;

impl MailService for Generic {
    fn kind(&self) -> ServiceKind {
        ServiceKind::Generic
    }
}

/// Service selector used in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Plain IMAP.
    #[default]
    Generic,
    /// Gmail with `X-GM-EXT-1`.
    Gmail,
}

impl ServiceKind {
    /// Instantiates the service.
    #[must_use]
    pub fn build(self) -> Box<dyn MailService> {
        match self {
            Self::Generic => Box::new(Generic),
            Self::Gmail => Box::new(Gmail),
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => f.write_str("generic"),
            Self::Gmail => f.write_str("gmail"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tagging::CleanTag;

    #[test]
    fn generic_mappings() {
        let service = Generic;
        assert_eq!(service.tag_to_flag("seen"), Some("\\Seen"));
        assert_eq!(service.tag_to_flag("starred"), None);
        assert_eq!(service.tag_to_label("Anything"), "Anything");
        assert_eq!(service.label_attribute(), None);
        assert!(service.archive_action().is_none());
        assert_eq!(
            service.mailbox_to_label("Work/Q3", &CleanTag::default()).as_deref(),
            Some("workq3")
        );
    }

    #[test]
    fn kind_round_trips_through_build() {
        assert_eq!(ServiceKind::Gmail.build().kind(), ServiceKind::Gmail);
        assert_eq!(ServiceKind::Generic.build().kind(), ServiceKind::Generic);
        assert_eq!(ServiceKind::Gmail.to_string(), "gmail");
    }
}

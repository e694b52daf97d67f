//! IMAP command builder.
//!
//! Only the commands a flag-sync session issues are modelled here.

mod serialize;
mod tag_generator;
mod types;

use crate::types::{Mailbox, UidSet};
use crate::{Error, Result};

pub use tag_generator::TagGenerator;
pub use types::{FetchAttribute, SearchCriteria, StoreAction, StoreMode};

use serialize::{
    write_astring, write_fetch_attributes, write_mailbox, write_search_criteria,
    write_store_action,
};

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY command.
    Capability,
    /// NOOP command.
    Noop,
    /// LOGOUT command.
    Logout,
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// SELECT command (read-write).
    Select {
        /// Mailbox to select.
        mailbox: Mailbox,
    },
    /// EXAMINE command (read-only SELECT).
    Examine {
        /// Mailbox to examine.
        mailbox: Mailbox,
    },
    /// UID SEARCH command.
    UidSearch {
        /// Search criteria.
        criteria: SearchCriteria,
    },
    /// UID FETCH command.
    UidFetch {
        /// UIDs to fetch.
        uids: UidSet,
        /// Attributes to fetch.
        attributes: Vec<FetchAttribute>,
    },
    /// UID STORE command.
    UidStore {
        /// UIDs to modify.
        uids: UidSet,
        /// What to store.
        action: StoreAction,
        /// Suppress the untagged FETCH echo.
        silent: bool,
    },
}

impl Command {
    /// Serializes the command to bytes with the given tag.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Noop => buf.extend_from_slice(b"NOOP"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),

            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }

            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_astring(&mut buf, pattern);
            }

            Self::Select { mailbox } => {
                buf.extend_from_slice(b"SELECT ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::Examine { mailbox } => {
                buf.extend_from_slice(b"EXAMINE ");
                write_mailbox(&mut buf, mailbox);
            }

            Self::UidSearch { criteria } => {
                buf.extend_from_slice(b"UID SEARCH ");
                write_search_criteria(&mut buf, criteria);
            }

            Self::UidFetch { uids, attributes } => {
                buf.extend_from_slice(b"UID FETCH ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_fetch_attributes(&mut buf, attributes);
            }

            Self::UidStore {
                uids,
                action,
                silent,
            } => {
                buf.extend_from_slice(b"UID STORE ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.push(b' ');
                write_store_action(&mut buf, action, *silent);
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Refuses commands whose arguments cannot be written as a single line.
    ///
    /// FETCH and STORE attribute names go out bare, so they must be atoms.
    /// Strings are quoted when needed, but a quoted string cannot carry CR,
    /// LF or NUL.
    pub fn check(&self) -> Result<()> {
        match self {
            Self::Capability | Self::Noop | Self::Logout | Self::UidSearch { .. } => Ok(()),
            Self::Login { username, password } => {
                check_line("username", username)?;
                check_line("password", password).map_err(|_| {
                    Error::Protocol("password contains CR, LF or NUL".to_string())
                })
            }
            Self::List { reference, pattern } => {
                check_line("LIST reference", reference)?;
                check_line("LIST pattern", pattern)
            }
            Self::Select { mailbox } | Self::Examine { mailbox } => {
                check_line("mailbox name", mailbox.as_str())
            }
            Self::UidFetch { attributes, .. } => attributes
                .iter()
                .try_for_each(|attr| check_atom("FETCH attribute", attr.as_str())),
            Self::UidStore { action, .. } => {
                check_atom("STORE attribute", &action.attribute)?;
                action
                    .values
                    .iter()
                    .try_for_each(|value| check_line("STORE value", value))
            }
        }
    }

    /// Returns a loggable form of the command with credentials masked.
    #[must_use]
    pub fn redacted(&self, tag: &str) -> String {
        match self {
            Self::Login { username, .. } => format!("{tag} LOGIN {username} ****"),
            other => String::from_utf8_lossy(&other.serialize(tag))
                .trim_end()
                .to_string(),
        }
    }
}

/// True if `s` is a non-empty IMAP atom: printable ASCII without
/// space or any of `(){%*"\]`.
///
/// ```
/// use flagsync_imap::is_atom;
///
/// assert!(is_atom("X-GM-LABELS"));
/// assert!(!is_atom("FLAGS (x)"));
/// assert!(!is_atom("FLAGS\r\nA1 NOOP"));
/// ```
#[must_use]
pub fn is_atom(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'\\' | b']')
        })
}

fn check_atom(what: &str, value: &str) -> Result<()> {
    if is_atom(value) {
        Ok(())
    } else {
        Err(Error::Protocol(format!("{what} {value:?} is not an IMAP atom")))
    }
}

fn check_line(what: &str, value: &str) -> Result<()> {
    if value.bytes().any(|b| matches!(b, b'\r' | b'\n' | 0)) {
        Err(Error::Protocol(format!("{what} {value:?} contains CR, LF or NUL")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use crate::types::Uid;

    use super::*;

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[test]
    fn test_capability_command() {
        assert_eq!(Command::Capability.serialize("A001"), b"A001 CAPABILITY\r\n");
    }

    #[test]
    fn test_login_quoted() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 LOGIN user@example.com \"pass word\"\r\n"
        );
    }

    #[test]
    fn test_login_is_redacted() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let logged = cmd.redacted("A001");
        assert_eq!(logged, "A001 LOGIN user ****");
        assert!(!logged.contains("hunter2"));
        assert_eq!(Command::Noop.redacted("A002"), "A002 NOOP");
    }

    #[test]
    fn test_list_all_mailboxes() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(cmd.serialize("A001"), b"A001 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn test_select_and_examine() {
        let select = Command::Select {
            mailbox: Mailbox::new("INBOX"),
        };
        let examine = Command::Examine {
            mailbox: Mailbox::new("[Gmail]/All Mail"),
        };
        assert_eq!(select.serialize("A001"), b"A001 SELECT INBOX\r\n");
        assert_eq!(
            examine.serialize("A002"),
            b"A002 EXAMINE \"[Gmail]/All Mail\"\r\n"
        );
    }

    #[test]
    fn test_uid_search_shapes() {
        let all = Command::UidSearch {
            criteria: SearchCriteria::All,
        };
        let bounded = Command::UidSearch {
            criteria: SearchCriteria::Uid(UidSet::range(uid(10), uid(20))),
        };
        let open = Command::UidSearch {
            criteria: SearchCriteria::Uid(UidSet::RangeFrom(uid(10))),
        };
        assert_eq!(all.serialize("A1"), b"A1 UID SEARCH ALL\r\n");
        assert_eq!(bounded.serialize("A2"), b"A2 UID SEARCH UID 10:20\r\n");
        assert_eq!(open.serialize("A3"), b"A3 UID SEARCH UID 10:*\r\n");
    }

    #[test]
    fn test_uid_fetch_command() {
        let cmd = Command::UidFetch {
            uids: UidSet::from_uids(&[uid(1), uid(2), uid(5)]).unwrap(),
            attributes: vec![
                FetchAttribute::Flags,
                FetchAttribute::Named("X-GM-LABELS".to_string()),
            ],
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 UID FETCH 1:2,5 (FLAGS X-GM-LABELS)\r\n"
        );
    }

    #[test]
    fn test_uid_fetch_single_attribute() {
        let cmd = Command::UidFetch {
            uids: UidSet::single(uid(7)),
            attributes: vec![FetchAttribute::Flags],
        };
        assert_eq!(cmd.serialize("A001"), b"A001 UID FETCH 7 FLAGS\r\n");
    }

    #[test]
    fn test_uid_store_flags() {
        let cmd = Command::UidStore {
            uids: UidSet::single(uid(42)),
            action: StoreAction::add("FLAGS", vec!["\\Seen".to_string(), "$Work".to_string()]),
            silent: false,
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 UID STORE 42 +FLAGS (\\Seen $Work)\r\n"
        );
    }

    #[test]
    fn test_uid_store_gmail_labels() {
        let cmd = Command::UidStore {
            uids: UidSet::single(uid(42)),
            action: StoreAction::remove(
                "X-GM-LABELS",
                vec!["\\Inbox".to_string(), "Big Project".to_string()],
            ),
            silent: true,
        };
        assert_eq!(
            cmd.serialize("A001"),
            b"A001 UID STORE 42 -X-GM-LABELS.SILENT (\\Inbox \"Big Project\")\r\n"
        );
    }

    #[test]
    fn store_attribute_cannot_carry_a_second_command() {
        let cmd = Command::UidStore {
            uids: UidSet::single(uid(4)),
            action: StoreAction::add(
                "FLAGS (x)\r\nA9 DELETE INBOX\r\nA8 NOOP",
                vec!["\\Seen".to_string()],
            ),
            silent: true,
        };
        assert!(matches!(cmd.check(), Err(Error::Protocol(_))));
    }

    #[test]
    fn fetch_attributes_must_be_atoms() {
        let bad = Command::UidFetch {
            uids: UidSet::single(uid(4)),
            attributes: vec![FetchAttribute::parse("FLAGS) (UID")],
        };
        let good = Command::UidFetch {
            uids: UidSet::single(uid(4)),
            attributes: vec![FetchAttribute::Flags, FetchAttribute::parse("x-gm-labels")],
        };
        assert!(bad.check().is_err());
        assert!(good.check().is_ok());
    }

    #[test]
    fn line_breaks_are_refused_in_strings() {
        let select = Command::Select {
            mailbox: Mailbox::new("INBOX\r\nA2 DELETE Archive"),
        };
        let store = Command::UidStore {
            uids: UidSet::single(uid(4)),
            action: StoreAction::add("FLAGS", vec!["a\nb".to_string()]),
            silent: true,
        };
        let login = Command::Login {
            username: "me".to_string(),
            password: "se\rcret".to_string(),
        };
        assert!(select.check().is_err());
        assert!(store.check().is_err());
        let Err(Error::Protocol(msg)) = login.check() else {
            panic!("password with CR accepted");
        };
        assert!(!msg.contains("se\rcret"));
    }
}

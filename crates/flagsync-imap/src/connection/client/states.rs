//! Type-state markers for IMAP client connection states.
//!
//! `Selected` carries the mailbox it was opened on, so the client can
//! report what is open without another round-trip.

use crate::types::{Mailbox, MailboxStatus, UidValidity};

/// Before LOGIN succeeds. Only LOGIN, CAPABILITY, NOOP and LOGOUT are
/// offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotAuthenticated;

/// Logged in, no mailbox open.
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

/// A mailbox is open, by SELECT or EXAMINE.
#[derive(Debug, Clone)]
pub struct Selected {
    pub(crate) mailbox: Mailbox,
    pub(crate) read_only: bool,
    pub(crate) status: MailboxStatus,
}

impl Selected {
    /// Records an opened mailbox and its SELECT/EXAMINE snapshot.
    #[must_use]
    pub const fn new(mailbox: Mailbox, read_only: bool, status: MailboxStatus) -> Self {
        Self {
            mailbox,
            read_only,
            status,
        }
    }

    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.mailbox
    }

    /// Returns true if the mailbox is open read-only, either because it
    /// was EXAMINEd or because the server refused write access.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        self.read_only || self.status.read_only
    }

    /// Returns the SELECT/EXAMINE snapshot.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.status
    }

    /// Returns the UIDVALIDITY the server reported.
    #[must_use]
    pub const fn uid_validity(&self) -> Option<UidValidity> {
        self.status.uid_validity
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Authenticated {}
    impl Sealed for super::Selected {}
}

/// States in which mailbox commands (LIST, SELECT, EXAMINE) are valid.
pub trait Authorized: sealed::Sealed {}

impl Authorized for Authenticated {}
impl Authorized for Selected {}

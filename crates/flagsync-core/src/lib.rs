//! # flagsync-core
//!
//! Incremental flag and label synchronization against an IMAP mailbox.
//!
//! This crate provides:
//! - [`Provider`]: session handling, mailbox resolution, UID queries and
//!   minimal flag deltas over one IMAP connection
//! - [`Transport`]: the seam between the provider and the wire, with
//!   [`ImapTransport`] as the real implementation
//! - [`MailService`] dialects: plain IMAP and Gmail
//! - [`TagNormalizer`]: how mailbox names become local tags
//! - configuration loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod provider;
pub mod service;
pub mod tagging;
pub mod transport;

pub use config::{AccountConfig, Settings, SyncSettings};
pub use error::{Error, Result};
pub use provider::{
    Access, AttributeBag, Credentials, FlagDelta, LabelMap, OpenMailbox, Provider, UidRange,
    WriteGate,
};
pub use service::{Generic, Gmail, MailService, ServiceKind};
pub use tagging::{CleanTag, TagNormalizer};
pub use transport::{ImapTransport, Transport};

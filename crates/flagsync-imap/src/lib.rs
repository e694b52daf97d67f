//! # flagsync-imap
//!
//! A small IMAP client covering the commands needed to synchronize message
//! flags: CAPABILITY, NOOP, LOGIN, LOGOUT, LIST, SELECT, EXAMINE, and the
//! UID forms of SEARCH, FETCH and STORE.
//!
//! ## Features
//!
//! - **Type-state connection management**: compile-time enforcement of valid
//!   IMAP state transitions (`NotAuthenticated` → `Authenticated` → `Selected`)
//! - **TLS via rustls**: no OpenSSL dependency
//! - **Sans-I/O parser**: protocol parsing separated from network I/O
//! - **Generic FETCH items**: vendor attributes such as `X-GM-LABELS` come
//!   back as plain name/value pairs
//!
//! ## Quick Start
//!
//! ```no_run
//! use flagsync_imap::{Client, Config, SearchCriteria};
//!
//! # async fn run() -> flagsync_imap::Result<()> {
//! let config = Config::new("imap.example.com");
//! let stream = flagsync_imap::connection::connect(&config).await?;
//! let client = Client::from_stream(stream)
//!     .await?
//!     .with_io_timeout(config.io_timeout);
//!
//! let client = client.login("user@example.com", "password").await?;
//! let mut client = client.examine("INBOX").await?;
//! let uids = client.uid_search(SearchCriteria::All).await?;
//! println!("{} messages", uids.len());
//!
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── select()/examine() ──→ Selected
//!                                       ↑                                    │
//!                                       └──────── rejected select() ─────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: IMAP command builders and types
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Sans-I/O response parser
//! - [`types`]: Core IMAP types (flags, mailboxes, UIDs, etc.)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{
    Command, FetchAttribute, SearchCriteria, StoreAction, StoreMode, TagGenerator, is_atom,
};
pub use connection::{
    Authenticated, Authorized, Client, Config, ConfigBuilder, FramedStream, ImapStream,
    NotAuthenticated, Rejected, Security, Selected,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, FetchValue, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Flag, Flags, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    SeqNum, Status, Tag, Uid, UidSet, UidValidity,
};

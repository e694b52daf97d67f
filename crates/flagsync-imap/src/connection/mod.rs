//! IMAP connection management.
//!
//! - Configuration (host, port, security mode, timeouts)
//! - TLS/plaintext stream abstraction
//! - Framed I/O for IMAP protocol
//! - Type-state client for the supported command subset

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Authorized, Client, NotAuthenticated, Rejected, Selected};
pub use config::{Config, ConfigBuilder, Security};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, create_tls_connector};

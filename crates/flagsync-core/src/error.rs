//! Error types for the core library.

use thiserror::Error;

/// Errors that can occur in provider operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The server could not be reached, or did not greet us, in time.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A read-write open was requested while writes are disabled.
    #[error("Two-way sync is disabled; refusing to open a mailbox for writing")]
    WriteDisabled,

    /// A message operation was attempted with no mailbox open.
    #[error("No mailbox is open")]
    NoMailboxOpen,

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IMAP operation failed.
    #[error("IMAP error: {0}")]
    Imap(#[from] flagsync_imap::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Account and sync configuration.
//!
//! Settings live in one JSON file, by default
//! `<config_dir>/flagsync/config.json`:
//!
//! ```json
//! {
//!   "account": {
//!     "host": "imap.gmail.com",
//!     "username": "me@gmail.com",
//!     "password": "app-password",
//!     "service": "gmail"
//!   },
//!   "sync": { "enable_write": false }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::WriteGate;
use crate::service::ServiceKind;
use crate::{Error, Result};

const fn default_port() -> u16 {
    993
}

const fn default_true() -> bool {
    true
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_io_timeout() -> u64 {
    60
}

const fn default_max_tag_length() -> usize {
    20
}

/// Connection and credential settings for one IMAP account.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Server hostname.
    pub host: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Implicit TLS when true, plaintext otherwise.
    #[serde(default = "default_true")]
    pub use_secure_transport: bool,
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Bound on connect, TLS handshake and greeting.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Bound on each command round-trip.
    #[serde(default = "default_io_timeout")]
    pub io_timeout_seconds: u64,
    /// Which mail service dialect to speak.
    #[serde(default)]
    pub service: ServiceKind,
    /// Longest label produced from a mailbox name.
    #[serde(default = "default_max_tag_length")]
    pub max_tag_length: usize,
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("use_secure_transport", &self.use_secure_transport)
            .field("username", &self.username)
            .field("password", &"****")
            .field("connect_timeout_seconds", &self.connect_timeout_seconds)
            .field("io_timeout_seconds", &self.io_timeout_seconds)
            .field("service", &self.service)
            .field("max_tag_length", &self.max_tag_length)
            .finish()
    }
}

impl AccountConfig {
    /// Creates a configuration with every optional field at its default.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            use_secure_transport: true,
            username: username.into(),
            password: password.into(),
            connect_timeout_seconds: default_connect_timeout(),
            io_timeout_seconds: default_io_timeout(),
            service: ServiceKind::default(),
            max_tag_length: default_max_tag_length(),
        }
    }

    /// Checks that the configuration can be used to connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("host is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(Error::Config("username is required".to_string()));
        }
        if self.port == 0 {
            return Err(Error::Config("port must be 1-65535".to_string()));
        }
        if self.connect_timeout_seconds == 0 {
            return Err(Error::Config(
                "connect_timeout_seconds must be positive".to_string(),
            ));
        }
        if self.io_timeout_seconds == 0 {
            return Err(Error::Config("io_timeout_seconds must be positive".to_string()));
        }
        if self.max_tag_length == 0 {
            return Err(Error::Config("max_tag_length must be positive".to_string()));
        }
        Ok(())
    }

    /// Connect timeout as a duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Per-command timeout as a duration.
    #[must_use]
    pub const fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_seconds)
    }

    /// Builds the IMAP connection configuration.
    #[must_use]
    pub fn imap_config(&self) -> flagsync_imap::Config {
        flagsync_imap::Config::builder(self.host.clone())
            .port(self.port)
            .security(flagsync_imap::Security::from_secure(self.use_secure_transport))
            .connect_timeout(self.connect_timeout())
            .io_timeout(self.io_timeout())
            .build()
    }
}

/// Sync behavior toggles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Allow opening mailboxes read-write and storing flags.
    #[serde(default)]
    pub enable_write: bool,
}

impl From<&SyncSettings> for WriteGate {
    fn from(settings: &SyncSettings) -> Self {
        Self::new(settings.enable_write)
    }
}

/// Contents of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// The account to sync.
    pub account: AccountConfig,
    /// Sync toggles.
    #[serde(default)]
    pub sync: SyncSettings,
}

impl Settings {
    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("flagsync")
            .join("config.json")
    }

    /// Parses and validates settings from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serde`] for malformed JSON and [`Error::Config`] for
    /// values that fail validation.
    pub fn from_json(contents: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(contents)?;
        settings.account.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file does not exist, and otherwise
    /// the I/O, parse or validation error.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "no configuration at {}",
                path.display()
            )));
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_json(&contents)?;
        debug!(path = %path.display(), account = ?settings.account, "settings loaded");
        Ok(settings)
    }

    /// Writes settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns the I/O or serialization error.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        Ok(())
    }
}

//! Server capabilities and response status.

/// Status of a tagged or status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }
}

/// A single capability announced by the server.
///
/// Only the capabilities the sync client branches on get their own variant.
/// Everything else is kept verbatim in [`Capability::Other`] so that callers
/// can still query it by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// `IMAP4rev2` (RFC 9051)
    Imap4Rev2,
    /// IDLE (RFC 2177)
    Idle,
    /// UIDPLUS (RFC 4315)
    UidPlus,
    /// CONDSTORE (RFC 7162)
    CondStore,
    /// Gmail extensions: `X-GM-LABELS`, `X-GM-THRID`, `X-GM-MSGID`.
    GmailExt1,
    /// LOGIN command disabled on this connection.
    LoginDisabled,
    /// SASL mechanism, e.g. `AUTH=PLAIN`.
    Auth(String),
    /// Any other capability atom, as sent.
    Other(String),
}

impl Capability {
    /// Parses a capability atom. Matching is case-insensitive.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "IMAP4REV2" => Self::Imap4Rev2,
            "IDLE" => Self::Idle,
            "UIDPLUS" => Self::UidPlus,
            "CONDSTORE" => Self::CondStore,
            "X-GM-EXT-1" => Self::GmailExt1,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(s[5..].to_string()),
            _ => Self::Other(s.to_string()),
        }
    }

    /// Returns true if this capability has the given name, ignoring case.
    ///
    /// ```
    /// use flagsync_imap::Capability;
    ///
    /// assert!(Capability::GmailExt1.is_named("x-gm-ext-1"));
    /// assert!(Capability::parse("MOVE").is_named("move"));
    /// ```
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.to_string().eq_ignore_ascii_case(name)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Imap4Rev2 => write!(f, "IMAP4rev2"),
            Self::Idle => write!(f, "IDLE"),
            Self::UidPlus => write!(f, "UIDPLUS"),
            Self::CondStore => write!(f, "CONDSTORE"),
            Self::GmailExt1 => write!(f, "X-GM-EXT-1"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

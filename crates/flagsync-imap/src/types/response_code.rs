//! Response codes.

use super::{Capability, Flag, Uid, UidValidity};

/// Bracketed response code carried by a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: human-readable message that must be shown to the user.
    Alert,
    /// CAPABILITY list, typically in the greeting or the LOGIN completion.
    Capability(Vec<Capability>),
    /// PERMANENTFLAGS: flags that can be changed permanently.
    PermanentFlags(Vec<Flag>),
    /// READ-ONLY: mailbox selected as read-only.
    ReadOnly,
    /// READ-WRITE: mailbox selected as read-write.
    ReadWrite,
    /// UIDNEXT: next UID to be assigned.
    UidNext(Uid),
    /// UIDVALIDITY: unique identifier validity value.
    UidValidity(UidValidity),
    /// HIGHESTMODSEQ (CONDSTORE).
    HighestModSeq(u64),
    /// AUTHENTICATIONFAILED (RFC 5530).
    AuthenticationFailed,
    /// Any other code, as its name.
    Unknown(String),
}

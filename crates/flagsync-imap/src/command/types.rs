//! Command-related type definitions.

use crate::types::UidSet;

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// UID.
    Uid,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// MODSEQ (CONDSTORE).
    ModSeq,
    /// Any other simple attribute, e.g. `X-GM-LABELS` or `X-GM-THRID`.
    Named(String),
}

impl FetchAttribute {
    /// Maps an attribute name to its variant, ignoring case.
    ///
    /// Names without a dedicated variant are upper-cased into
    /// [`FetchAttribute::Named`].
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "FLAGS" => Self::Flags,
            "UID" => Self::Uid,
            "INTERNALDATE" => Self::InternalDate,
            "RFC822.SIZE" => Self::Rfc822Size,
            "MODSEQ" => Self::ModSeq,
            _ => Self::Named(upper),
        }
    }

    /// Returns the attribute name as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flags => "FLAGS",
            Self::Uid => "UID",
            Self::InternalDate => "INTERNALDATE",
            Self::Rfc822Size => "RFC822.SIZE",
            Self::ModSeq => "MODSEQ",
            Self::Named(name) => name,
        }
    }
}

/// How a STORE changes the stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Replace the whole set.
    Replace,
    /// Add values (`+`).
    Add,
    /// Remove values (`-`).
    Remove,
}

impl StoreMode {
    pub(crate) const fn prefix(self) -> &'static str {
        match self {
            Self::Replace => "",
            Self::Add => "+",
            Self::Remove => "-",
        }
    }
}

/// STORE action on a multi-valued attribute.
///
/// The attribute is usually `FLAGS`, but Gmail exposes labels through the
/// same STORE syntax as `X-GM-LABELS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreAction {
    /// Replace, add or remove.
    pub mode: StoreMode,
    /// Attribute name, e.g. `FLAGS`.
    pub attribute: String,
    /// Values to store, as they should appear on the wire.
    pub values: Vec<String>,
}

impl StoreAction {
    /// Adds `values` to `attribute`.
    #[must_use]
    pub fn add(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            mode: StoreMode::Add,
            attribute: attribute.into(),
            values,
        }
    }

    /// Removes `values` from `attribute`.
    #[must_use]
    pub fn remove(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            mode: StoreMode::Remove,
            attribute: attribute.into(),
            values,
        }
    }
}

/// SEARCH criteria used by the sync client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages whose UID is in the set.
    Uid(UidSet),
}

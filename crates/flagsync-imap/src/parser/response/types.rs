//! Response data types.

use crate::types::{Capability, Flags, ListResponse, ResponseCode, SeqNum, Uid};

/// Value of one FETCH data item.
///
/// Structured items (ENVELOPE, BODYSTRUCTURE, body sections) are skipped by
/// the parser, so every value here is flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchValue {
    /// Numeric value, e.g. `UID`, `RFC822.SIZE`, `X-GM-THRID`, `MODSEQ`.
    Number(u64),
    /// String value, e.g. `INTERNALDATE`.
    Text(String),
    /// Parenthesized list, e.g. `FLAGS` or `X-GM-LABELS`.
    List(Vec<String>),
    /// NIL.
    Nil,
}

impl FetchValue {
    /// Returns the list items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the number, if this is a number.
    #[must_use]
    pub const fn as_number(&self) -> Option<u64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// One `NAME value` pair from a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItem {
    /// Item name, upper-cased.
    pub name: String,
    /// Item value.
    pub value: FetchValue,
}

impl FetchItem {
    /// Finds the UID among a message's items.
    #[must_use]
    pub fn find_uid(items: &[Self]) -> Option<Uid> {
        items
            .iter()
            .find(|item| item.name == "UID")
            .and_then(|item| item.value.as_number())
            .and_then(|n| u32::try_from(n).ok())
            .and_then(Uid::new)
    }
}

/// Untagged response data.
#[derive(Debug, Clone, PartialEq)]
pub enum UntaggedResponse {
    /// OK response with optional code.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// NO response.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BAD response.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// PREAUTH greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// BYE response.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// CAPABILITY response.
    Capability(Vec<Capability>),
    /// LIST response.
    List(ListResponse),
    /// FLAGS response.
    Flags(Flags),
    /// EXISTS response (message count).
    Exists(u32),
    /// RECENT response.
    Recent(u32),
    /// EXPUNGE response (message removed).
    Expunge(SeqNum),
    /// FETCH response.
    Fetch {
        /// Message sequence number.
        seq: SeqNum,
        /// Fetch data items.
        items: Vec<FetchItem>,
    },
    /// SEARCH response. Holds UIDs after UID SEARCH.
    Search(Vec<u32>),
    /// Untagged data this client does not interpret, by keyword.
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, value: FetchValue) -> FetchItem {
        FetchItem {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn uid_is_found_among_items() {
        let items = vec![
            item("FLAGS", FetchValue::List(vec!["\\Seen".to_string()])),
            item("UID", FetchValue::Number(4827)),
        ];
        assert_eq!(FetchItem::find_uid(&items).map(Uid::get), Some(4827));
    }

    #[test]
    fn missing_or_oversized_uid_is_none() {
        assert_eq!(FetchItem::find_uid(&[]), None);
        let wide = vec![item("UID", FetchValue::Number(u64::from(u32::MAX) + 1))];
        assert_eq!(FetchItem::find_uid(&wide), None);
    }

    #[test]
    fn value_accessors() {
        assert_eq!(FetchValue::Number(3).as_number(), Some(3));
        assert_eq!(FetchValue::Nil.as_list(), None);
        assert_eq!(
            FetchValue::List(vec!["a".to_string()]).as_list(),
            Some(&["a".to_string()][..])
        );
    }
}

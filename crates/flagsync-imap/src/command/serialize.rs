//! Command serialization helpers.

use crate::types::Mailbox;

use super::types::{FetchAttribute, SearchCriteria, StoreAction};

/// Writes an astring (atom or quoted string).
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

/// Writes a mailbox name.
pub fn write_mailbox(buf: &mut Vec<u8>, mailbox: &Mailbox) {
    write_astring(buf, mailbox.as_str());
}

/// Returns true if the byte cannot appear in an atom. Atoms are ASCII, so
/// UTF-8 names and labels go out quoted.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*')
        || b < 0x20
        || b >= 0x7F
}

/// Writes one value inside a STORE list.
///
/// System flags and system labels (`\Seen`, `\Inbox`) go out bare, everything
/// else as an astring.
fn write_store_value(buf: &mut Vec<u8>, value: &str) {
    match value.strip_prefix('\\') {
        Some(rest) if !rest.is_empty() && !rest.bytes().any(needs_quoting) => {
            buf.extend_from_slice(value.as_bytes());
        }
        _ => write_astring(buf, value),
    }
}

/// Writes FETCH attributes, parenthesized when there is more than one.
pub fn write_fetch_attributes(buf: &mut Vec<u8>, attrs: &[FetchAttribute]) {
    if let [single] = attrs {
        buf.extend_from_slice(single.as_str().as_bytes());
        return;
    }
    buf.push(b'(');
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(attr.as_str().as_bytes());
    }
    buf.push(b')');
}

/// Writes a STORE action.
pub fn write_store_action(buf: &mut Vec<u8>, action: &StoreAction, silent: bool) {
    buf.extend_from_slice(action.mode.prefix().as_bytes());
    buf.extend_from_slice(action.attribute.as_bytes());
    if silent {
        buf.extend_from_slice(b".SILENT");
    }
    buf.extend_from_slice(b" (");
    for (i, value) in action.values.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        write_store_value(buf, value);
    }
    buf.push(b')');
}

/// Writes SEARCH criteria.
pub fn write_search_criteria(buf: &mut Vec<u8>, criteria: &SearchCriteria) {
    match criteria {
        SearchCriteria::All => buf.extend_from_slice(b"ALL"),
        SearchCriteria::Uid(set) => {
            buf.extend_from_slice(b"UID ");
            buf.extend_from_slice(set.to_string().as_bytes());
        }
    }
}

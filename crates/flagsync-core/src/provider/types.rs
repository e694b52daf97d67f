//! Values passed in and out of the provider.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flagsync_imap::{FetchValue, Uid};

/// Label → remote mailbox name.
pub type LabelMap = BTreeMap<String, String>;

/// Login credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"****")
            .finish()
    }
}

/// Shared switch that permits read-write mailbox access.
///
/// Clones share the same switch, so the owner can flip it while a
/// provider holds a copy.
#[derive(Debug, Clone, Default)]
pub struct WriteGate(Arc<AtomicBool>);

impl WriteGate {
    /// Creates a gate in the given position.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    /// Returns true if writes are allowed.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Allows or forbids writes.
    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Release);
    }
}

/// How a mailbox is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// EXAMINE.
    #[default]
    ReadOnly,
    /// SELECT; requires the [`WriteGate`] to be open.
    ReadWrite,
}

/// The mailbox the session currently has open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMailbox {
    /// Remote mailbox name.
    pub name: String,
    /// How it was opened.
    pub access: Access,
}

/// Bounds for a UID query. Both ends are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UidRange {
    /// Lowest UID wanted.
    pub from: Option<Uid>,
    /// Highest UID wanted.
    pub to: Option<Uid>,
}

impl UidRange {
    /// Every message.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Messages with UID at least `from`.
    #[must_use]
    pub const fn starting_at(from: Uid) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Messages with UID at most `to`.
    #[must_use]
    pub const fn up_to(to: Uid) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Messages with UID in `from..=to`.
    #[must_use]
    pub const fn between(from: Uid, to: Uid) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }
}

/// Fetched attributes of one message.
///
/// Holds exactly the requested fields the server returned, keyed by the
/// name the caller asked for. Missing fields stay missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeBag {
    /// The message.
    pub uid: Uid,
    attributes: BTreeMap<String, FetchValue>,
}

impl AttributeBag {
    /// Creates an empty bag for `uid`.
    #[must_use]
    pub const fn new(uid: Uid) -> Self {
        Self {
            uid,
            attributes: BTreeMap::new(),
        }
    }

    /// Records a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: FetchValue) {
        self.attributes.insert(field.into(), value);
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FetchValue> {
        self.attributes.get(field)
    }

    /// Returns a list-valued field such as `FLAGS`.
    #[must_use]
    pub fn list(&self, field: &str) -> Option<&[String]> {
        self.get(field).and_then(FetchValue::as_list)
    }

    /// Iterates over `(field, value)` pairs in field order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FetchValue)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the server supplied none of the requested fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Changes needed to turn one value set into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagDelta {
    /// Values in the new set but not the old.
    pub additions: Vec<String>,
    /// Values in the old set but not the new.
    pub removals: Vec<String>,
}

impl FlagDelta {
    /// Computes `new − old` and `old − new`, keeping input order.
    ///
    /// ```
    /// use flagsync_core::FlagDelta;
    ///
    /// let old = ["a".to_string(), "b".to_string()];
    /// let new = ["b".to_string(), "c".to_string()];
    /// let delta = FlagDelta::between(&old, &new);
    /// assert_eq!(delta.additions, ["c"]);
    /// assert_eq!(delta.removals, ["a"]);
    /// ```
    #[must_use]
    pub fn between(old: &[String], new: &[String]) -> Self {
        Self {
            additions: difference(new, old),
            removals: difference(old, new),
        }
    }

    /// Returns true when the sets were equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }
}

fn difference(left: &[String], right: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in left {
        if !right.contains(value) && !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn delta_of_equal_sets_is_empty() {
        let s = set(&["\\Seen", "work"]);
        assert!(FlagDelta::between(&s, &s).is_empty());
        assert!(FlagDelta::between(&s, &set(&["work", "\\Seen"])).is_empty());
    }

    #[test]
    fn delta_from_empty_is_all_additions() {
        let delta = FlagDelta::between(&[], &set(&["a", "b"]));
        assert_eq!(delta.additions, set(&["a", "b"]));
        assert!(delta.removals.is_empty());
    }

    #[test]
    fn duplicates_are_collapsed() {
        let delta = FlagDelta::between(&set(&["x", "x"]), &set(&["y", "y"]));
        assert_eq!(delta.additions, set(&["y"]));
        assert_eq!(delta.removals, set(&["x"]));
    }

    #[test]
    fn write_gate_clones_share_state() {
        let gate = WriteGate::default();
        let held = gate.clone();
        assert!(!held.is_enabled());
        gate.set(true);
        assert!(held.is_enabled());
    }

    #[test]
    fn credentials_debug_hides_password() {
        let printed = format!("{:?}", Credentials::new("me", "s3cret"));
        assert!(!printed.contains("s3cret"));
    }

    #[test]
    fn bag_lists() {
        let mut bag = AttributeBag::new(Uid::new(3).unwrap());
        bag.insert("FLAGS", FetchValue::List(set(&["\\Seen"])));
        bag.insert("X-GM-THRID", FetchValue::Number(99));

        assert_eq!(bag.list("FLAGS").unwrap(), ["\\Seen".to_string()]);
        assert_eq!(bag.list("X-GM-THRID"), None);
        assert_eq!(bag.get("INTERNALDATE"), None);
        assert_eq!(bag.len(), 2);
    }
}

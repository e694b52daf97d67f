//! Message flags.

/// A message flag as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Flag {
    /// Message has been read.
    Seen,
    /// Message has been answered.
    Answered,
    /// Message is flagged for special attention.
    Flagged,
    /// Message is marked for deletion.
    Deleted,
    /// Message is a draft.
    Draft,
    /// Message is recent (first session to see it).
    Recent,
    /// `\*` in PERMANENTFLAGS: the client may create new keywords.
    Wildcard,
    /// Keyword or any other flag, kept as sent.
    Keyword(String),
}

impl Flag {
    /// Parses a flag string. System flags match case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\SEEN" => Self::Seen,
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
            "\\*" => Self::Wildcard,
            _ => Self::Keyword(s.to_string()),
        }
    }

    /// Returns the flag as an IMAP string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Seen => "\\Seen",
            Self::Answered => "\\Answered",
            Self::Flagged => "\\Flagged",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
            Self::Wildcard => "\\*",
            Self::Keyword(s) => s,
        }
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free collection of flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    flags: Vec<Flag>,
}

impl Flags {
    /// Creates an empty flags collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a flag unless it is already present.
    pub fn insert(&mut self, flag: Flag) {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
    }

    /// Returns true if the flag is present.
    #[must_use]
    pub fn contains(&self, flag: &Flag) -> bool {
        self.flags.contains(flag)
    }

    /// Returns an iterator over the flags.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.flags.iter()
    }

    /// Returns the number of flags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Returns true if there are no flags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Read as PERMANENTFLAGS: can `flag` be stored so it persists?
    ///
    /// Listed flags always can; unlisted keywords only when `\*` is
    /// present. An empty set means the server sent no PERMANENTFLAGS, in
    /// which case RFC 3501 says every flag is permanent.
    #[must_use]
    pub fn permits(&self, flag: &Flag) -> bool {
        self.is_empty()
            || self.contains(flag)
            || (matches!(flag, Flag::Keyword(_)) && self.contains(&Flag::Wildcard))
    }

    /// Read as PERMANENTFLAGS: may the client invent keywords?
    #[must_use]
    pub fn accepts_new_keywords(&self) -> bool {
        self.is_empty() || self.contains(&Flag::Wildcard)
    }
}

impl std::fmt::Display for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(Flag::as_str).collect();
        write!(f, "({})", names.join(" "))
    }
}

impl FromIterator<Flag> for Flags {
    fn from_iter<I: IntoIterator<Item = Flag>>(iter: I) -> Self {
        let mut flags = Self::new();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl IntoIterator for Flags {
    type Item = Flag;
    type IntoIter = std::vec::IntoIter<Flag>;

    fn into_iter(self) -> Self::IntoIter {
        self.flags.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_flags_ignore_case() {
        assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
        assert_eq!(Flag::parse("\\SEEN"), Flag::Seen);
        assert_eq!(Flag::parse("\\flagged"), Flag::Flagged);
    }

    #[test]
    fn keywords_keep_their_spelling() {
        let flag = Flag::parse("$Forwarded");
        assert_eq!(flag, Flag::Keyword("$Forwarded".to_string()));
        assert_eq!(flag.as_str(), "$Forwarded");
    }

    #[test]
    fn wildcard_round_trips() {
        assert_eq!(Flag::parse("\\*"), Flag::Wildcard);
        assert_eq!(Flag::Wildcard.to_string(), "\\*");
    }

    #[test]
    fn permanent_flags_gate_new_keywords() {
        let fixed: Flags = [Flag::Seen, Flag::Flagged].into_iter().collect();
        assert!(fixed.permits(&Flag::Seen));
        assert!(!fixed.permits(&Flag::Keyword("$Work".to_string())));

        let open: Flags = [Flag::Seen, Flag::Wildcard].into_iter().collect();
        assert!(open.permits(&Flag::Keyword("$Work".to_string())));
        assert!(!open.permits(&Flag::Deleted));

        assert!(Flags::new().permits(&Flag::Deleted));
        assert!(Flags::new().accepts_new_keywords());
        assert!(!fixed.accepts_new_keywords());
    }

    #[test]
    fn collecting_drops_duplicates() {
        let flags: Flags = [Flag::Seen, Flag::Draft, Flag::Seen].into_iter().collect();
        assert_eq!(flags.len(), 2);
        assert!(flags.contains(&Flag::Draft));
        assert_eq!(flags.to_string(), "(\\Seen \\Draft)");
    }
}

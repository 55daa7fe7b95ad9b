//! Message flags.

/// Message flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
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
    /// Custom keyword flag.
    Keyword(String),
}

impl Flag {
    /// Parses a flag string.
    ///
    /// System flags match case-insensitively; anything else is a keyword.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "\\SEEN" => Self::Seen,
            "\\ANSWERED" => Self::Answered,
            "\\FLAGGED" => Self::Flagged,
            "\\DELETED" => Self::Deleted,
            "\\DRAFT" => Self::Draft,
            "\\RECENT" => Self::Recent,
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
            Self::Keyword(s) => s,
        }
    }

    /// Returns true for flags defined by the protocol itself.
    #[must_use]
    pub const fn is_system(&self) -> bool {
        !matches!(self, Self::Keyword(_))
    }
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Writes a parenthesized flag list, e.g. `(\Seen $Label)`.
pub(crate) fn write_flag_list(buf: &mut Vec<u8>, flags: &[Flag]) {
    buf.push(b'(');
    for (i, flag) in flags.iter().enumerate() {
        if i > 0 {
            buf.push(b' ');
        }
        buf.extend_from_slice(flag.as_str().as_bytes());
    }
    buf.push(b')');
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    mod flag_tests {
        use super::*;

        #[test]
        fn parse_is_case_insensitive() {
            assert_eq!(Flag::parse("\\Seen"), Flag::Seen);
            assert_eq!(Flag::parse("\\SEEN"), Flag::Seen);
            assert_eq!(Flag::parse("\\seen"), Flag::Seen);
        }

        #[test]
        fn parse_system_flags() {
            assert_eq!(Flag::parse("\\Answered"), Flag::Answered);
            assert_eq!(Flag::parse("\\Flagged"), Flag::Flagged);
            assert_eq!(Flag::parse("\\Deleted"), Flag::Deleted);
            assert_eq!(Flag::parse("\\Draft"), Flag::Draft);
            assert_eq!(Flag::parse("\\Recent"), Flag::Recent);
        }

        #[test]
        fn parse_keyword() {
            assert_eq!(
                Flag::parse("$Important"),
                Flag::Keyword("$Important".to_string())
            );
            assert_eq!(Flag::parse("Seen"), Flag::Keyword("Seen".to_string()));
        }

        #[test]
        fn as_str_round_trips() {
            for flag in [
                Flag::Seen,
                Flag::Answered,
                Flag::Flagged,
                Flag::Deleted,
                Flag::Draft,
                Flag::Recent,
                Flag::Keyword("Custom".to_string()),
            ] {
                assert_eq!(Flag::parse(flag.as_str()), flag);
            }
        }

        #[test]
        fn is_system() {
            assert!(Flag::Seen.is_system());
            assert!(!Flag::Keyword("x".to_string()).is_system());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", Flag::Seen), "\\Seen");
            assert_eq!(format!("{}", Flag::Keyword("Test".to_string())), "Test");
        }
    }

    #[test]
    fn flag_list() {
        let mut buf = Vec::new();
        write_flag_list(&mut buf, &[Flag::Deleted, Flag::Keyword("$Label".to_string())]);
        assert_eq!(buf, b"(\\Deleted $Label)");

        let mut buf = Vec::new();
        write_flag_list(&mut buf, &[]);
        assert_eq!(buf, b"()");
    }
}

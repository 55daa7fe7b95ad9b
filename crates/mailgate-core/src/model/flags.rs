//! Message flags split into standard and custom sets.

use std::collections::BTreeSet;

use mailgate_imap::Flag;
use serde::{Deserialize, Serialize};

/// The system flags defined by RFC 3501.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StandardFlag {
    /// `\Seen`
    Seen,
    /// `\Flagged`
    Flagged,
    /// `\Answered`
    Answered,
    /// `\Deleted`
    Deleted,
    /// `\Draft`
    Draft,
    /// `\Recent` (server-managed; STORE of it is refused by servers).
    Recent,
}

impl StandardFlag {
    /// Every standard flag.
    pub const ALL: [Self; 6] = [
        Self::Seen,
        Self::Flagged,
        Self::Answered,
        Self::Deleted,
        Self::Draft,
        Self::Recent,
    ];

    /// Returns the wire form, e.g. `\Seen`.
    #[must_use]
    pub const fn as_imap(self) -> &'static str {
        match self {
            Self::Seen => "\\Seen",
            Self::Flagged => "\\Flagged",
            Self::Answered => "\\Answered",
            Self::Deleted => "\\Deleted",
            Self::Draft => "\\Draft",
            Self::Recent => "\\Recent",
        }
    }

    /// Maps a wire token to a standard flag, ignoring case.
    #[must_use]
    pub fn from_imap(token: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|flag| flag.as_imap().eq_ignore_ascii_case(token))
    }

    const fn to_flag(self) -> Flag {
        match self {
            Self::Seen => Flag::Seen,
            Self::Flagged => Flag::Flagged,
            Self::Answered => Flag::Answered,
            Self::Deleted => Flag::Deleted,
            Self::Draft => Flag::Draft,
            Self::Recent => Flag::Recent,
        }
    }
}

impl std::fmt::Display for StandardFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_imap())
    }
}

/// Flags of one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    /// System flags.
    pub standard: BTreeSet<StandardFlag>,
    /// Keywords and any other token, verbatim.
    pub custom: BTreeSet<String>,
}

impl FlagSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts wire tokens into standard and custom flags.
    ///
    /// Unrecognized tokens are always custom.
    #[must_use]
    pub fn parse<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        for token in tokens {
            let token = token.as_ref();
            match StandardFlag::from_imap(token) {
                Some(flag) => {
                    set.standard.insert(flag);
                }
                None => {
                    set.custom.insert(token.to_string());
                }
            }
        }
        set
    }

    /// Adds a standard flag.
    #[must_use]
    pub fn with(mut self, flag: StandardFlag) -> Self {
        self.standard.insert(flag);
        self
    }

    /// Adds a custom flag.
    #[must_use]
    pub fn with_custom(mut self, keyword: impl Into<String>) -> Self {
        self.custom.insert(keyword.into());
        self
    }

    /// Returns true if the standard flag is set.
    #[must_use]
    pub fn contains(&self, flag: StandardFlag) -> bool {
        self.standard.contains(&flag)
    }

    /// Returns true if the custom flag is set.
    #[must_use]
    pub fn contains_custom(&self, keyword: &str) -> bool {
        self.custom.contains(keyword)
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.standard.is_empty() && self.custom.is_empty()
    }

    /// Converts to protocol flags for STORE, standard flags first.
    ///
    /// `\Recent` is left out; only the server sets it.
    #[must_use]
    pub fn to_imap_flags(&self) -> Vec<Flag> {
        self.standard
            .iter()
            .filter(|flag| **flag != StandardFlag::Recent)
            .map(|flag| flag.to_flag())
            .chain(self.custom.iter().map(|keyword| Flag::Keyword(keyword.clone())))
            .collect()
    }
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

    mod standard_flag_tests {
        use super::*;

        #[test]
        fn mapping_is_bidirectional() {
            for flag in StandardFlag::ALL {
                assert_eq!(StandardFlag::from_imap(flag.as_imap()), Some(flag));
            }
        }

        #[test]
        fn case_insensitive() {
            assert_eq!(StandardFlag::from_imap("\\SEEN"), Some(StandardFlag::Seen));
            assert_eq!(StandardFlag::from_imap("\\flagged"), Some(StandardFlag::Flagged));
        }

        #[test]
        fn keywords_are_not_standard() {
            assert_eq!(StandardFlag::from_imap("Seen"), None);
            assert_eq!(StandardFlag::from_imap("$Forwarded"), None);
        }
    }

    mod flag_set_tests {
        use super::*;

        #[test]
        fn parse_splits_standard_and_custom() {
            let set = FlagSet::parse(["\\Seen", "\\Flagged", "CustomFlag"]);
            assert_eq!(
                set.standard,
                BTreeSet::from([StandardFlag::Seen, StandardFlag::Flagged])
            );
            assert_eq!(set.custom, BTreeSet::from(["CustomFlag".to_string()]));
        }

        #[test]
        fn unknown_system_flag_is_custom() {
            let set = FlagSet::parse(["\\Important"]);
            assert!(set.standard.is_empty());
            assert!(set.contains_custom("\\Important"));
        }

        #[test]
        fn to_imap_flags() {
            let set = FlagSet::new()
                .with(StandardFlag::Draft)
                .with(StandardFlag::Seen)
                .with_custom("$Label1");
            assert_eq!(
                set.to_imap_flags(),
                vec![
                    Flag::Seen,
                    Flag::Draft,
                    Flag::Keyword("$Label1".to_string())
                ]
            );
        }

        #[test]
        fn recent_is_never_stored() {
            let set = FlagSet::new()
                .with(StandardFlag::Recent)
                .with(StandardFlag::Flagged);
            assert_eq!(set.to_imap_flags(), vec![Flag::Flagged]);
            assert!(FlagSet::new().with(StandardFlag::Recent).to_imap_flags().is_empty());
        }

        #[test]
        fn serde_shape() {
            let set = FlagSet::new().with(StandardFlag::Seen).with_custom("work");
            let json = serde_json::to_string(&set).unwrap();
            assert_eq!(json, r#"{"standard":["seen"],"custom":["work"]}"#);
        }
    }
}

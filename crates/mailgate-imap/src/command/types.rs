//! Command-related type definitions.

use crate::types::{Flag, UidSet};

/// STATUS attributes to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAttribute {
    /// Number of messages.
    Messages,
    /// Number of recent messages.
    Recent,
    /// Next UID.
    UidNext,
    /// UIDVALIDITY.
    UidValidity,
    /// Number of unseen messages.
    Unseen,
}

impl StatusAttribute {
    /// Returns the attribute name as sent on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Messages => "MESSAGES",
            Self::Recent => "RECENT",
            Self::UidNext => "UIDNEXT",
            Self::UidValidity => "UIDVALIDITY",
            Self::Unseen => "UNSEEN",
        }
    }
}

/// Individual FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 size.
    Rfc822Size,
    /// Envelope structure.
    Envelope,
    /// Body structure.
    BodyStructure,
    /// UID.
    Uid,
    /// Body section.
    Body {
        /// Section specifier, e.g. `1.2` or `HEADER`.
        section: Option<String>,
        /// Peek (don't set \Seen).
        peek: bool,
        /// Partial fetch range.
        partial: Option<(u32, u32)>,
    },
}

impl FetchAttribute {
    /// `BODY.PEEK[section]`, the form used for every content fetch.
    #[must_use]
    pub fn peek_section(section: impl Into<String>) -> Self {
        Self::Body {
            section: Some(section.into()),
            peek: true,
            partial: None,
        }
    }
}

/// STORE action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreAction {
    /// Add flags.
    AddFlags(Vec<Flag>),
    /// Remove flags.
    RemoveFlags(Vec<Flag>),
}

/// SEARCH criteria.
///
/// Dates are IMAP `date` strings such as `1-Feb-2024`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// All messages.
    All,
    /// Messages with \Answered flag.
    Answered,
    /// Messages without \Answered flag.
    Unanswered,
    /// Messages with \Deleted flag.
    Deleted,
    /// Messages without \Deleted flag.
    Undeleted,
    /// Messages with \Draft flag.
    Draft,
    /// Messages without \Draft flag.
    Undraft,
    /// Messages with \Flagged flag.
    Flagged,
    /// Messages without \Flagged flag.
    Unflagged,
    /// Messages with \Recent and without \Seen.
    New,
    /// Messages with \Seen flag.
    Seen,
    /// Messages without \Seen flag.
    Unseen,
    /// Messages carrying a keyword flag.
    Keyword(String),
    /// Messages not carrying a keyword flag.
    Unkeyword(String),
    /// UID set.
    UidSet(UidSet),
    /// Subject contains text.
    Subject(String),
    /// From contains text.
    From(String),
    /// To contains text.
    To(String),
    /// Cc contains text.
    Cc(String),
    /// Body contains text.
    Body(String),
    /// Text in header or body.
    Text(String),
    /// Internal date on or after date.
    Since(String),
    /// Internal date before date.
    Before(String),
    /// Internal date on date.
    On(String),
    /// Larger than size.
    Larger(u32),
    /// Smaller than size.
    Smaller(u32),
    /// Header field contains value.
    Header(String, String),
    /// AND of criteria.
    And(Vec<Self>),
    /// OR of criteria.
    Or(Box<Self>, Box<Self>),
    /// NOT of criteria.
    Not(Box<Self>),
    /// Criteria text passed through unchanged.
    Raw(String),
}

impl SearchCriteria {
    /// Returns true if every string argument is ASCII, i.e. the search
    /// needs no `CHARSET UTF-8` prefix.
    #[must_use]
    pub fn is_ascii(&self) -> bool {
        self.all_text(&|s: &str| s.is_ascii())
    }

    /// Returns true if no string argument contains CR, LF or NUL.
    #[must_use]
    pub fn is_wire_safe(&self) -> bool {
        self.all_text(&super::serialize::is_wire_safe)
    }

    fn all_text(&self, check: &impl Fn(&str) -> bool) -> bool {
        match self {
            Self::Keyword(s)
            | Self::Unkeyword(s)
            | Self::Subject(s)
            | Self::From(s)
            | Self::To(s)
            | Self::Cc(s)
            | Self::Body(s)
            | Self::Text(s)
            | Self::Since(s)
            | Self::Before(s)
            | Self::On(s)
            | Self::Raw(s) => check(s),
            Self::Header(name, value) => check(name) && check(value),
            Self::And(all) => all.iter().all(|c| c.all_text(check)),
            Self::Or(a, b) => a.all_text(check) && b.all_text(check),
            Self::Not(c) => c.all_text(check),
            _ => true,
        }
    }
}

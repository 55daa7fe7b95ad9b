//! Search query builder.
//!
//! A [`Query`] is a tree of search keys that renders to the protocol's
//! [`SearchCriteria`]. Text keys are matched by the server (substring,
//! case-insensitive); dates compare against INTERNALDATE and ignore time
//! and timezone.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use mailgate_core::Query;
//!
//! let since = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
//! let query = Query::from_address("alice@example.com")
//!     .and(Query::Unseen)
//!     .and(Query::Since(since));
//! assert_eq!(
//!     query.to_criteria().to_string(),
//!     "FROM alice@example.com UNSEEN SINCE 1-Feb-2024"
//! );
//! ```

use chrono::NaiveDate;
use mailgate_imap::SearchCriteria;

/// A message search.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Query {
    /// Every message.
    #[default]
    All,
    /// `\Seen` set.
    Seen,
    /// `\Seen` not set.
    Unseen,
    /// `\Flagged` set.
    Flagged,
    /// `\Flagged` not set.
    Unflagged,
    /// `\Answered` set.
    Answered,
    /// `\Deleted` set.
    Deleted,
    /// `\Draft` set.
    Draft,
    /// Keyword (custom flag) set.
    Keyword(String),
    /// From header contains the text.
    From(String),
    /// To header contains the text.
    To(String),
    /// Subject contains the text.
    Subject(String),
    /// Body contains the text.
    Body(String),
    /// Headers or body contain the text.
    Text(String),
    /// Named header contains the text.
    Header(String, String),
    /// Internal date on or after the day.
    Since(NaiveDate),
    /// Internal date before the day.
    Before(NaiveDate),
    /// Internal date within the day.
    On(NaiveDate),
    /// Larger than the size in bytes.
    Larger(u32),
    /// Smaller than the size in bytes.
    Smaller(u32),
    /// Every sub-query matches.
    And(Vec<Query>),
    /// Either sub-query matches.
    Or(Box<Query>, Box<Query>),
    /// The sub-query does not match.
    Not(Box<Query>),
}

impl Query {
    /// Messages from an address or name.
    #[must_use]
    pub fn from_address(text: impl Into<String>) -> Self {
        Self::From(text.into())
    }

    /// Messages addressed to an address or name.
    #[must_use]
    pub fn to_address(text: impl Into<String>) -> Self {
        Self::To(text.into())
    }

    /// Messages whose subject contains the text.
    #[must_use]
    pub fn subject(text: impl Into<String>) -> Self {
        Self::Subject(text.into())
    }

    /// Messages whose headers or body contain the text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Combines with another query; both must match.
    ///
    /// Nested conjunctions are flattened and `All` is absorbed.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut terms = match self {
            Self::All => Vec::new(),
            Self::And(terms) => terms,
            other => vec![other],
        };
        match other {
            Self::All => {}
            Self::And(more) => terms.extend(more),
            other => terms.push(other),
        }
        match terms.len() {
            0 => Self::All,
            1 => terms.remove(0),
            _ => Self::And(terms),
        }
    }

    /// Combines with another query; either may match.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Renders the query as protocol search criteria.
    #[must_use]
    pub fn to_criteria(&self) -> SearchCriteria {
        match self {
            Self::All => SearchCriteria::All,
            Self::Seen => SearchCriteria::Seen,
            Self::Unseen => SearchCriteria::Unseen,
            Self::Flagged => SearchCriteria::Flagged,
            Self::Unflagged => SearchCriteria::Unflagged,
            Self::Answered => SearchCriteria::Answered,
            Self::Deleted => SearchCriteria::Deleted,
            Self::Draft => SearchCriteria::Draft,
            Self::Keyword(k) => SearchCriteria::Keyword(k.clone()),
            Self::From(s) => SearchCriteria::From(s.clone()),
            Self::To(s) => SearchCriteria::To(s.clone()),
            Self::Subject(s) => SearchCriteria::Subject(s.clone()),
            Self::Body(s) => SearchCriteria::Body(s.clone()),
            Self::Text(s) => SearchCriteria::Text(s.clone()),
            Self::Header(name, value) => SearchCriteria::Header(name.clone(), value.clone()),
            Self::Since(day) => SearchCriteria::Since(imap_date(*day)),
            Self::Before(day) => SearchCriteria::Before(imap_date(*day)),
            Self::On(day) => SearchCriteria::On(imap_date(*day)),
            Self::Larger(n) => SearchCriteria::Larger(*n),
            Self::Smaller(n) => SearchCriteria::Smaller(*n),
            Self::And(terms) => SearchCriteria::And(terms.iter().map(Self::to_criteria).collect()),
            Self::Or(a, b) => {
                SearchCriteria::Or(Box::new(a.to_criteria()), Box::new(b.to_criteria()))
            }
            Self::Not(inner) => SearchCriteria::Not(Box::new(inner.to_criteria())),
        }
    }
}

impl std::ops::Not for Query {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

/// Formats a day as an IMAP `date` (`1-Feb-2024`).
fn imap_date(day: NaiveDate) -> String {
    day.format("%-d-%b-%Y").to_string()
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

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    mod builder_tests {
        use super::*;

        #[test]
        fn and_flattens() {
            let q = Query::Seen.and(Query::Flagged).and(Query::Draft);
            assert_eq!(
                q,
                Query::And(vec![Query::Seen, Query::Flagged, Query::Draft])
            );
        }

        #[test]
        fn and_absorbs_all() {
            assert_eq!(Query::All.and(Query::Seen), Query::Seen);
            assert_eq!(Query::Seen.and(Query::All), Query::Seen);
            assert_eq!(Query::All.and(Query::All), Query::All);
        }

        #[test]
        fn double_negation() {
            assert_eq!(!!Query::Seen, Query::Seen);
            assert_eq!(!Query::Seen, Query::Not(Box::new(Query::Seen)));
        }
    }

    mod criteria_tests {
        use super::*;

        #[test]
        fn dates() {
            assert_eq!(imap_date(day(2024, 2, 1)), "1-Feb-2024");
            assert_eq!(imap_date(day(1999, 12, 31)), "31-Dec-1999");
            assert_eq!(
                Query::Before(day(2024, 11, 5)).to_criteria(),
                SearchCriteria::Before("5-Nov-2024".to_string())
            );
        }

        #[test]
        fn nested() {
            let q = Query::subject("report").and(!Query::Seen.or(Query::Flagged));
            assert_eq!(
                q.to_criteria(),
                SearchCriteria::And(vec![
                    SearchCriteria::Subject("report".to_string()),
                    SearchCriteria::Not(Box::new(SearchCriteria::Or(
                        Box::new(SearchCriteria::Seen),
                        Box::new(SearchCriteria::Flagged),
                    ))),
                ])
            );
        }

        #[test]
        fn default_is_all() {
            assert_eq!(Query::default().to_criteria(), SearchCriteria::All);
        }
    }
}

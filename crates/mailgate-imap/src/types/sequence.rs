//! UID sets for message ranges.

use super::Uid;

/// UID-based sequence set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidSet {
    /// Single UID.
    Single(Uid),
    /// Range of UIDs (inclusive).
    Range(Uid, Uid),
    /// Range from start to highest UID.
    RangeFrom(Uid),
    /// All messages.
    All,
    /// Multiple UID specifications.
    Set(Vec<Self>),
}

impl UidSet {
    /// Creates a UID set from a single UID.
    #[must_use]
    pub const fn single(uid: Uid) -> Self {
        Self::Single(uid)
    }

    /// Creates a UID set from a range.
    #[must_use]
    pub const fn range(start: Uid, end: Uid) -> Self {
        Self::Range(start, end)
    }

    /// Builds the most compact set covering exactly `uids`.
    ///
    /// Returns `None` for an empty slice, which has no wire form.
    #[must_use]
    pub fn from_uids(uids: &[Uid]) -> Option<Self> {
        let mut sorted = uids.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut runs: Vec<Self> = Vec::new();
        let mut iter = sorted.into_iter();
        let first = iter.next()?;
        let (mut start, mut end) = (first, first);

        for uid in iter {
            if end.get().checked_add(1) == Some(uid.get()) {
                end = uid;
            } else {
                runs.push(Self::run(start, end));
                start = uid;
                end = uid;
            }
        }
        runs.push(Self::run(start, end));

        if runs.len() == 1 {
            runs.pop()
        } else {
            Some(Self::Set(runs))
        }
    }

    fn run(start: Uid, end: Uid) -> Self {
        if start == end {
            Self::Single(start)
        } else {
            Self::Range(start, end)
        }
    }
}

impl From<Uid> for UidSet {
    fn from(uid: Uid) -> Self {
        Self::Single(uid)
    }
}

impl std::fmt::Display for UidSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(n) => write!(f, "{n}"),
            Self::Range(start, end) => write!(f, "{start}:{end}"),
            Self::RangeFrom(start) => write!(f, "{start}:*"),
            Self::All => write!(f, "1:*"),
            Self::Set(items) => {
                let s: Vec<_> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", s.join(","))
            }
        }
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

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    mod uid_set_tests {
        use super::*;

        #[test]
        fn display_single() {
            assert_eq!(UidSet::single(uid(100)).to_string(), "100");
        }

        #[test]
        fn display_range() {
            assert_eq!(UidSet::range(uid(1), uid(100)).to_string(), "1:100");
        }

        #[test]
        fn display_range_from() {
            assert_eq!(UidSet::RangeFrom(uid(50)).to_string(), "50:*");
        }

        #[test]
        fn display_all() {
            assert_eq!(UidSet::All.to_string(), "1:*");
        }

        #[test]
        fn display_set() {
            let set = UidSet::Set(vec![UidSet::single(uid(1)), UidSet::range(uid(5), uid(10))]);
            assert_eq!(set.to_string(), "1,5:10");
        }

        #[test]
        fn from_single_uid() {
            let set: UidSet = uid(7).into();
            assert_eq!(set, UidSet::Single(uid(7)));
        }
    }

    mod from_uids_tests {
        use super::*;

        #[test]
        fn empty_is_none() {
            assert!(UidSet::from_uids(&[]).is_none());
        }

        #[test]
        fn single() {
            let set = UidSet::from_uids(&[uid(42)]).unwrap();
            assert_eq!(set.to_string(), "42");
        }

        #[test]
        fn contiguous_becomes_range() {
            let set = UidSet::from_uids(&[uid(3), uid(1), uid(2)]).unwrap();
            assert_eq!(set.to_string(), "1:3");
        }

        #[test]
        fn gaps_become_set() {
            let set = UidSet::from_uids(&[uid(105), uid(100), uid(101), uid(102), uid(101)]).unwrap();
            assert_eq!(set.to_string(), "100:102,105");
        }
    }
}

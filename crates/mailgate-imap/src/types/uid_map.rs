//! Source-to-destination UID mapping from a COPYUID response code (RFC 4315).

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use super::{Uid, UidValidity};

/// Largest UID range expanded from a single COPYUID set.
const MAX_EXPANDED_UIDS: usize = 1_000_000;

/// UIDs assigned in the destination mailbox by COPY or MOVE.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UidMap {
    /// UIDVALIDITY of the destination mailbox.
    pub uid_validity: Option<UidValidity>,
    pairs: BTreeMap<Uid, Uid>,
}

impl UidMap {
    /// Builds a mapping from the two UID sets of a COPYUID response code.
    ///
    /// Sets are paired in order, as the server lists them. Returns `None`
    /// when the sets expand to different lengths or contain UID 0.
    #[must_use]
    pub fn from_ranges(
        uid_validity: u32,
        source: &[RangeInclusive<u32>],
        destination: &[RangeInclusive<u32>],
    ) -> Option<Self> {
        let source = expand(source)?;
        let destination = expand(destination)?;
        if source.len() != destination.len() {
            return None;
        }

        Some(Self {
            uid_validity: UidValidity::new(uid_validity),
            pairs: source.into_iter().zip(destination).collect(),
        })
    }

    /// Returns the destination UID for a source UID.
    #[must_use]
    pub fn get(&self, source: Uid) -> Option<Uid> {
        self.pairs.get(&source).copied()
    }

    /// Returns the number of mapped messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if nothing was mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over `(source, destination)` pairs in source order.
    pub fn iter(&self) -> impl Iterator<Item = (Uid, Uid)> + '_ {
        self.pairs.iter().map(|(s, d)| (*s, *d))
    }
}

fn expand(ranges: &[RangeInclusive<u32>]) -> Option<Vec<Uid>> {
    let mut uids = Vec::new();
    for range in ranges {
        // Servers may send "5:3" for 3..=5.
        let (lo, hi) = if range.start() <= range.end() {
            (*range.start(), *range.end())
        } else {
            (*range.end(), *range.start())
        };
        if (hi - lo) as usize >= MAX_EXPANDED_UIDS {
            return None;
        }
        for n in lo..=hi {
            uids.push(Uid::new(n)?);
        }
    }
    Some(uids)
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

    #[test]
    fn single_pair() {
        let map = UidMap::from_ranges(38505, &[42..=42], &[100..=100]).unwrap();
        assert_eq!(map.get(uid(42)), Some(uid(100)));
        assert_eq!(map.len(), 1);
        assert_eq!(map.uid_validity.unwrap().get(), 38505);
    }

    #[test]
    fn ranges_pair_in_order() {
        let map = UidMap::from_ranges(1, &[100..=102, 105..=105], &[200..=203]).unwrap();
        let pairs: Vec<_> = map.iter().map(|(s, d)| (s.get(), d.get())).collect();
        assert_eq!(pairs, vec![(100, 200), (101, 201), (102, 202), (105, 203)]);
    }

    #[test]
    fn reversed_range_is_normalized() {
        let map = UidMap::from_ranges(1, &[5..=3], &[10..=12]).unwrap();
        assert_eq!(map.get(uid(3)), Some(uid(10)));
        assert_eq!(map.get(uid(5)), Some(uid(12)));
    }

    #[test]
    fn length_mismatch_is_rejected() {
        assert!(UidMap::from_ranges(1, &[1..=3], &[10..=11]).is_none());
    }

    #[test]
    fn zero_uid_is_rejected() {
        assert!(UidMap::from_ranges(1, &[0..=0], &[10..=10]).is_none());
    }

    #[test]
    fn unmapped_uid() {
        let map = UidMap::from_ranges(1, &[1..=1], &[2..=2]).unwrap();
        assert_eq!(map.get(uid(9)), None);
        assert!(!map.is_empty());
    }
}

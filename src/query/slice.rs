use std::cmp::Ordering;

use crate::comparator::ComparatorRef;
use crate::query::Selection;
use crate::util::{Result, Slice};

/// A contiguous run of names, walked in either direction, capped at `count`.
///
/// An empty `start` or `finish` leaves that end of the range open. Ascending
/// ranges run from the first name `>= start` through names `<= finish`;
/// reversed ranges run from the last name `<= start` down through names
/// `>= finish`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceRange {
    pub start: Slice,
    pub finish: Slice,
    pub reversed: bool,
    pub count: usize,
}

impl SliceRange {
    pub fn new(
        start: impl Into<Slice>,
        finish: impl Into<Slice>,
        reversed: bool,
        count: usize,
    ) -> Self {
        SliceRange {
            start: start.into(),
            finish: finish.into(),
            reversed,
            count,
        }
    }

    /// Every name, ascending, unbounded.
    pub fn all() -> Self {
        SliceRange::new(Slice::empty(), Slice::empty(), false, usize::MAX)
    }

    /// Both bounds set with `start` already past `finish` in the walk
    /// direction: nothing can match.
    pub fn is_inverted(&self, comparator: ComparatorRef) -> bool {
        if self.start.is_empty() || self.finish.is_empty() {
            return false;
        }
        let ord = comparator.compare_names(self.start.data(), self.finish.data());
        if self.reversed {
            ord == Ordering::Less
        } else {
            ord == Ordering::Greater
        }
    }

    /// Choose positions within a sorted run of `len` names.
    ///
    /// `name_at` reads the name at a position; it is called O(log len) times.
    pub fn select<F>(&self, len: usize, comparator: ComparatorRef, mut name_at: F) -> Result<Selection>
    where
        F: FnMut(usize) -> Result<Slice>,
    {
        if self.is_inverted(comparator) || self.count == 0 {
            return Ok(Selection::empty());
        }

        let (lo, hi) = if self.reversed {
            let hi = if self.start.is_empty() {
                len
            } else {
                upper_bound(len, comparator, &self.start, &mut name_at)?
            };
            let lo = if self.finish.is_empty() {
                0
            } else {
                lower_bound(len, comparator, &self.finish, &mut name_at)?
            };
            (lo, hi)
        } else {
            let lo = if self.start.is_empty() {
                0
            } else {
                lower_bound(len, comparator, &self.start, &mut name_at)?
            };
            let hi = if self.finish.is_empty() {
                len
            } else {
                upper_bound(len, comparator, &self.finish, &mut name_at)?
            };
            (lo, hi)
        };

        Ok(Selection::Range {
            lo,
            hi: hi.max(lo),
            reversed: self.reversed,
            remaining: self.count,
        })
    }
}

/// First position whose name is `>= target`.
pub(crate) fn lower_bound<F>(
    len: usize,
    comparator: ComparatorRef,
    target: &Slice,
    name_at: &mut F,
) -> Result<usize>
where
    F: FnMut(usize) -> Result<Slice>,
{
    partition(len, |i| {
        let name = name_at(i)?;
        Ok(comparator.compare_names(name.data(), target.data()) == Ordering::Less)
    })
}

/// First position whose name is `> target`.
pub(crate) fn upper_bound<F>(
    len: usize,
    comparator: ComparatorRef,
    target: &Slice,
    name_at: &mut F,
) -> Result<usize>
where
    F: FnMut(usize) -> Result<Slice>,
{
    partition(len, |i| {
        let name = name_at(i)?;
        Ok(comparator.compare_names(name.data(), target.data()) != Ordering::Greater)
    })
}

/// Fallible `partition_point`: the first position for which `pred` is false.
fn partition(len: usize, mut pred: impl FnMut(usize) -> Result<bool>) -> Result<usize> {
    let (mut lo, mut hi) = (0, len);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid)? {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{get_comparator, ComparatorType};

    const NAMES: [&str; 6] = ["col1", "col2", "col3", "col4", "col5", "col6"];

    fn run(range: &SliceRange) -> Vec<&'static str> {
        let cmp = get_comparator(ComparatorType::Name);
        range
            .select(NAMES.len(), cmp, |i| Ok(Slice::from(NAMES[i])))
            .unwrap()
            .map(|i| NAMES[i])
            .collect()
    }

    #[test]
    fn test_ascending_bounds_are_inclusive() {
        assert_eq!(run(&SliceRange::new("col2", "col4", false, 100)), ["col2", "col3", "col4"]);
        assert_eq!(run(&SliceRange::new("col2", "col2", false, 100)), ["col2"]);
    }

    #[test]
    fn test_bounds_between_names() {
        assert_eq!(run(&SliceRange::new("col2a", "col4a", false, 100)), ["col3", "col4"]);
        assert_eq!(run(&SliceRange::new("col0", "col1a", false, 100)), ["col1"]);
    }

    #[test]
    fn test_open_ends() {
        assert_eq!(run(&SliceRange::new("", "col2", false, 100)), ["col1", "col2"]);
        assert_eq!(run(&SliceRange::new("col5", "", false, 100)), ["col5", "col6"]);
        assert_eq!(run(&SliceRange::all()).len(), 6);
    }

    #[test]
    fn test_count_limits() {
        assert_eq!(run(&SliceRange::new("col2", "", false, 2)), ["col2", "col3"]);
        assert!(run(&SliceRange::new("", "", false, 0)).is_empty());
    }

    #[test]
    fn test_reversed() {
        assert_eq!(run(&SliceRange::new("col4", "col2", true, 100)), ["col4", "col3", "col2"]);
        assert_eq!(run(&SliceRange::new("", "", true, 2)), ["col6", "col5"]);
        assert_eq!(run(&SliceRange::new("col3a", "", true, 100)), ["col3", "col2", "col1"]);
        assert_eq!(run(&SliceRange::new("", "col5", true, 100)), ["col6", "col5"]);
    }

    #[test]
    fn test_inverted_ranges_match_nothing() {
        let cmp = get_comparator(ComparatorType::Name);
        let backwards = SliceRange::new("col4", "col2", false, 100);
        assert!(backwards.is_inverted(cmp));
        assert!(run(&backwards).is_empty());

        let reversed_wrong_way = SliceRange::new("col2", "col4", true, 100);
        assert!(reversed_wrong_way.is_inverted(cmp));
        assert!(run(&reversed_wrong_way).is_empty());

        assert!(!SliceRange::new("col4", "", false, 1).is_inverted(cmp));
    }

    #[test]
    fn test_range_outside_data() {
        assert!(run(&SliceRange::new("col7", "col9", false, 100)).is_empty());
        assert!(run(&SliceRange::new("a", "b", false, 100)).is_empty());
    }

    #[test]
    fn test_name_read_error_propagates() {
        let cmp = get_comparator(ComparatorType::Name);
        let err = SliceRange::new("col2", "", false, 1)
            .select(4, cmp, |_| Err(crate::util::Status::corruption("bad row")))
            .unwrap_err();
        assert!(err.is_corruption());
    }
}

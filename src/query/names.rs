use std::cmp::Ordering;

use crate::comparator::ComparatorRef;
use crate::query::slice::lower_bound;
use crate::query::Selection;
use crate::util::{Result, Slice};

/// An explicit set of names. Results come back in comparator order whatever
/// order the names were given in; duplicates collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamesFilter {
    names: Vec<Slice>,
}

impl NamesFilter {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Slice>,
    {
        NamesFilter {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[Slice] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn select<F>(&self, len: usize, comparator: ComparatorRef, mut name_at: F) -> Result<Selection>
    where
        F: FnMut(usize) -> Result<Slice>,
    {
        let mut positions = Vec::with_capacity(self.names.len());
        for name in &self.names {
            let pos = lower_bound(len, comparator, name, &mut name_at)?;
            if pos < len {
                let found = name_at(pos)?;
                if comparator.compare_names(found.data(), name.data()) == Ordering::Equal {
                    positions.push(pos);
                }
            }
        }
        positions.sort_unstable();
        positions.dedup();
        Ok(Selection::Positions(positions.into_iter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{get_comparator, ComparatorType};

    const NAMES: [&str; 4] = ["a", "c", "e", "g"];

    fn run(filter: &NamesFilter) -> Vec<&'static str> {
        let cmp = get_comparator(ComparatorType::Name);
        filter
            .select(NAMES.len(), cmp, |i| Ok(Slice::from(NAMES[i])))
            .unwrap()
            .map(|i| NAMES[i])
            .collect()
    }

    #[test]
    fn test_present_names_in_order() {
        assert_eq!(run(&NamesFilter::new(["g", "a", "e"])), ["a", "e", "g"]);
    }

    #[test]
    fn test_missing_and_duplicate_names() {
        assert_eq!(run(&NamesFilter::new(["b", "c", "c", "z"])), ["c"]);
        assert!(run(&NamesFilter::new(Vec::<Slice>::new())).is_empty());
    }
}

//! Query filters.
//!
//! A [`QueryFilter`] decides two things: which top-level entries of a row a
//! read returns, and which children of a super column survive when a read
//! addresses one super column. Every storage source (memtable rows, SSTable
//! rows) turns a filter into a [`Selection`] of positions over its own sorted
//! entries, so the range logic lives in exactly one place.
//!
//! ```text
//! Identity            every name, ascending, no limit
//! Slice(SliceRange)   start..=finish, either direction, at most `count`
//! Names(NamesFilter)  an explicit set of names, count ignored
//! ```

mod names;
mod path;
mod selection;
mod slice;

pub use names::NamesFilter;
pub use path::QueryPath;
pub use selection::Selection;
pub use slice::SliceRange;

use crate::column::SuperColumn;
use crate::comparator::ComparatorRef;
use crate::util::{Result, Slice};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QueryFilter {
    #[default]
    Identity,
    Slice(SliceRange),
    Names(NamesFilter),
}

impl QueryFilter {
    pub fn identity() -> Self {
        QueryFilter::Identity
    }

    pub fn slice(
        start: impl Into<Slice>,
        finish: impl Into<Slice>,
        reversed: bool,
        count: usize,
    ) -> Self {
        QueryFilter::Slice(SliceRange::new(start, finish, reversed, count))
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Slice>,
    {
        QueryFilter::Names(NamesFilter::new(names))
    }

    pub fn is_reversed(&self) -> bool {
        matches!(self, QueryFilter::Slice(range) if range.reversed)
    }

    /// Upper bound on top-level entries returned.
    pub fn count(&self) -> usize {
        match self {
            QueryFilter::Slice(range) => range.count,
            QueryFilter::Identity | QueryFilter::Names(_) => usize::MAX,
        }
    }

    pub fn is_inverted(&self, comparator: ComparatorRef) -> bool {
        match self {
            QueryFilter::Slice(range) => range.is_inverted(comparator),
            QueryFilter::Identity | QueryFilter::Names(_) => false,
        }
    }

    /// Positions of the matching entries in a sorted run of `len` names, in
    /// the order the filter walks them.
    pub fn select<F>(&self, len: usize, comparator: ComparatorRef, name_at: F) -> Result<Selection>
    where
        F: FnMut(usize) -> Result<Slice>,
    {
        match self {
            QueryFilter::Identity => SliceRange::all().select(len, comparator, name_at),
            QueryFilter::Slice(range) => range.select(len, comparator, name_at),
            QueryFilter::Names(names) => names.select(len, comparator, name_at),
        }
    }

    /// Drop the children of `sc` this filter does not select.
    pub fn filter_super_column(&self, mut sc: SuperColumn) -> Result<SuperColumn> {
        if matches!(self, QueryFilter::Identity) {
            return Ok(sc);
        }
        let comparator = sc.comparator();
        let children = sc.sub_columns();
        let mut positions: Vec<usize> = self
            .select(children.len(), comparator, |i| Ok(children[i].name().clone()))?
            .collect();
        positions.sort_unstable();
        sc.retain_positions(&positions);
        Ok(sc)
    }
}

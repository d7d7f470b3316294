use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::column::{reconcile, ColumnEntry};
use crate::comparator::ComparatorRef;
use crate::iterator::ColumnIter;
use crate::util::Result;

/// K-way merge of per-source column streams into one reconciled stream.
///
/// Every child yields unique names in the query's walk order (ascending, or
/// descending for reversed slices). The merge emits each name once: all
/// versions of a name across sources are folded together with
/// [`reconcile`]. Because reconciliation does not depend on argument order,
/// the relative priority of sources does not affect the result.
///
/// # Architecture
///
/// ```text
/// MergingIterator
///     ├─→ Heap of (head entry, child index), next name in walk order on top
///     └─→ Vec<ColumnIter> (children)
/// ```
///
/// Each `next()` pops the top entry, then pops every other head with the same
/// name, reconciling as it goes, and refills the heap from the children it
/// consumed. Cost is O(log k) per version pulled, for k children.
pub struct MergingIterator {
    children: Vec<ColumnIter>,
    heap: BinaryHeap<HeapEntry>,
    comparator: ComparatorRef,
    reversed: bool,
    started: bool,
    failed: bool,
}

struct HeapEntry {
    entry: ColumnEntry,
    index: usize,
    comparator: ComparatorRef,
    reversed: bool,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops the greatest: for an ascending walk the smallest
        // name must compare greatest.
        let by_name = self
            .comparator
            .compare_names(self.entry.name().data(), other.entry.name().data());
        let by_name = if self.reversed { by_name } else { by_name.reverse() };
        by_name
            // among equal names the newest version surfaces first
            .then_with(|| self.comparator.compare(&other.entry, &self.entry))
            .then_with(|| other.index.cmp(&self.index))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for HeapEntry {}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl MergingIterator {
    pub fn new(children: Vec<ColumnIter>, comparator: ComparatorRef, reversed: bool) -> Self {
        MergingIterator {
            heap: BinaryHeap::with_capacity(children.len()),
            children,
            comparator,
            reversed,
            started: false,
            failed: false,
        }
    }

    /// Pull the next entry of child `index` into the heap.
    fn refill(&mut self, index: usize) -> Result<()> {
        match self.children[index].next() {
            Some(Ok(entry)) => {
                self.heap.push(HeapEntry {
                    entry,
                    index,
                    comparator: self.comparator,
                    reversed: self.reversed,
                });
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Ok(()),
        }
    }

    fn next_entry(&mut self) -> Result<Option<ColumnEntry>> {
        if !self.started {
            self.started = true;
            for index in 0..self.children.len() {
                self.refill(index)?;
            }
        }

        let Some(top) = self.heap.pop() else {
            return Ok(None);
        };
        self.refill(top.index)?;
        let mut merged = top.entry;

        while let Some(peek) = self.heap.peek() {
            let same_name = self
                .comparator
                .compare_names(peek.entry.name().data(), merged.name().data())
                == Ordering::Equal;
            if !same_name {
                break;
            }
            let Some(version) = self.heap.pop() else {
                break;
            };
            self.refill(version.index)?;
            merged = reconcile(merged, version.entry);
        }

        Ok(Some(merged))
    }
}

impl Iterator for MergingIterator {
    type Item = Result<ColumnEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_entry() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

//! Checkpoint position tracking within a sub-batch
//!
//! Tasks inside a sub-batch finish in any order. The checkpoint written after
//! each completion is the lowest index still in flight, or one past the
//! sub-batch's last index once all of them are done, so resuming never skips
//! an unfinished row.

use crate::table::Task;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SubBatchProgress {
    pending: BTreeSet<usize>,
    end: usize,
}

impl SubBatchProgress {
    pub fn new(tasks: &[Task]) -> Self {
        let pending: BTreeSet<usize> = tasks.iter().map(|t| t.index).collect();
        let end = pending.last().map(|last| last + 1).unwrap_or(0);
        Self { pending, end }
    }

    /// Marks `index` finished and returns the checkpoint value to persist
    pub fn complete(&mut self, index: usize) -> usize {
        self.pending.remove(&index);
        self.next_index()
    }

    /// Lowest row that is not yet durably finished
    pub fn next_index(&self) -> usize {
        self.pending.first().copied().unwrap_or(self.end)
    }

    /// Rows not yet completed, lowest first
    pub fn pending(&self) -> Vec<usize> {
        self.pending.iter().copied().collect()
    }

    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

//! Conflict detection between the two bib sources of a place.

use crate::{Bib, Record};

/// True iff both bibs are recorded and they differ.
///
/// An unset bib never conflicts; the recorded value wins by absorption.
pub fn is_conflict(bib_num: &Bib, checker_bib: &Bib) -> bool {
    bib_num.is_set() && checker_bib.is_set() && bib_num != checker_bib
}

/// Number of places whose bibs currently disagree.
pub fn count_conflicts(records: &[Record]) -> usize {
    records.iter().filter(|r| r.has_conflict()).count()
}

/// Indices of places whose bibs currently disagree.
pub fn conflicting_indices(records: &[Record]) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_conflict())
        .map(|(i, _)| i)
        .collect()
}

/// Raises an alert only when the open-conflict count grows.
///
/// Resolving conflicts one at a time lowers the count and must stay quiet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConflictMonitor {
    last_seen: usize,
}

/// Emitted when more conflicts are open than at the last observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictAlert {
    /// Conflicts now open
    pub open: usize,
    /// Conflicts added since the last observation
    pub added: usize,
}

impl ConflictMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current count, returning an alert if it increased.
    pub fn observe(&mut self, open: usize) -> Option<ConflictAlert> {
        let previous = std::mem::replace(&mut self.last_seen, open);
        (open > previous).then(|| ConflictAlert {
            open,
            added: open - previous,
        })
    }

    pub fn last_seen(&self) -> usize {
        self.last_seen
    }
}

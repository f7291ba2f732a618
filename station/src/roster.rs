//! Participant lookup by bib, for display next to results.

use crate::remote::Participant;
use finishline_engine::Bib;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_bib: HashMap<u32, Participant>,
}

impl Roster {
    /// Index participants by bib. Entries whose bib is not a bib number are
    /// skipped; a repeated bib keeps the last entry.
    pub fn new(participants: impl IntoIterator<Item = Participant>) -> Self {
        let by_bib = participants
            .into_iter()
            .filter_map(|p| Bib::parse(&p.bib_num).number().map(|bib| (bib, p)))
            .collect();
        Self { by_bib }
    }

    pub fn get(&self, bib: &Bib) -> Option<&Participant> {
        bib.number().and_then(|n| self.by_bib.get(&n))
    }

    /// "First Last" for a known bib, empty otherwise.
    pub fn display_name(&self, bib: &Bib) -> String {
        self.get(bib)
            .map(|p| format!("{} {}", p.first_name, p.last_name).trim().to_string())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_bib.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_bib.is_empty()
    }
}

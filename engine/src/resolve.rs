//! Conflict resolution on a merged record set.
//!
//! Every resolution settles both bib fields of a place and writes the chosen
//! bib back into both raw bib arrays of the event, so a later merge of the same
//! data reproduces the resolved record.

use crate::{error::Result, Bib, Error, EventData, RecordStore};
use serde::{Deserialize, Serialize};

/// Which of the two bib values of a place to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BibChoice {
    BibNum,
    CheckerBib,
}

/// Direction of a resolve-everything action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchDirection {
    /// Keep the remote value (`bib_num`) everywhere
    UseCloud,
    /// Keep the local value (`checker_bib`) everywhere
    UseLocal,
}

impl BatchDirection {
    fn choice(self) -> BibChoice {
        match self {
            BatchDirection::UseCloud => BibChoice::BibNum,
            BatchDirection::UseLocal => BibChoice::CheckerBib,
        }
    }
}

/// A place that was settled on a bib.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub bib: Bib,
}

/// What a resolution call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutcome {
    /// Places settled by this call
    pub resolved: Vec<Resolution>,
    /// Conflicts still open
    pub remaining: usize,
    /// This call closed the last open conflict; the record set should be
    /// validated and committed without further input
    pub submit: bool,
}

impl ResolveOutcome {
    /// Whether the event's raw arrays changed and need saving.
    pub fn needs_persist(&self) -> bool {
        !self.resolved.is_empty()
    }
}

/// Applies resolutions to a record set and its event.
pub struct Resolver<'a> {
    store: &'a mut RecordStore,
    event: &'a mut EventData,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a mut RecordStore, event: &'a mut EventData) -> Self {
        Self { store, event }
    }

    /// Keep one of the two bib values at `index`.
    ///
    /// A place that is not in conflict is left untouched.
    pub fn resolve(&mut self, index: usize, choice: BibChoice) -> Result<ResolveOutcome> {
        let len = self.store.len();
        let record = self.store.get(index).ok_or(Error::PlaceOutOfRange {
            place: index + 1,
            len,
        })?;
        if !record.has_conflict() {
            return Ok(self.outcome(Vec::new()));
        }

        let bib = chosen(&record.bib_num, &record.checker_bib, choice);
        self.store.batch(|records| records[index].settle(bib.clone()));
        self.event.persist_resolution(index, bib.raw());

        Ok(self.outcome(vec![Resolution { index, bib }]))
    }

    /// Settle every open conflict in one direction.
    pub fn resolve_all(&mut self, direction: BatchDirection) -> ResolveOutcome {
        let choice = direction.choice();
        let resolved = self.store.batch(|records| {
            let mut resolved = Vec::new();
            for (index, record) in records.iter_mut().enumerate() {
                if record.has_conflict() {
                    let bib = chosen(&record.bib_num, &record.checker_bib, choice);
                    record.settle(bib.clone());
                    resolved.push(Resolution { index, bib });
                }
            }
            resolved
        });

        for resolution in &resolved {
            self.event.persist_resolution(resolution.index, resolution.bib.raw());
        }
        self.outcome(resolved)
    }

    fn outcome(&self, resolved: Vec<Resolution>) -> ResolveOutcome {
        let remaining = self.store.conflict_count();
        ResolveOutcome {
            submit: remaining == 0 && !resolved.is_empty(),
            resolved,
            remaining,
        }
    }
}

fn chosen(bib_num: &Bib, checker_bib: &Bib, choice: BibChoice) -> Bib {
    match choice {
        BibChoice::BibNum => bib_num.clone(),
        BibChoice::CheckerBib => checker_bib.clone(),
    }
}

/// Result of tapping a place in swap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The place is now selected
    Selected(usize),
    /// The selected place and the tapped place exchanged bibs
    Swapped(usize, usize),
    /// The selected place was tapped again
    Cleared,
}

/// Two-tap swap gesture: select a place, then tap the place to swap with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapSelection {
    selected: Option<usize>,
}

impl SwapSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn tap(&mut self, store: &mut RecordStore, index: usize) -> Result<TapOutcome> {
        if index >= store.len() {
            return Err(Error::PlaceOutOfRange {
                place: index + 1,
                len: store.len(),
            });
        }
        match self.selected.take() {
            None => {
                self.selected = Some(index);
                Ok(TapOutcome::Selected(index))
            }
            Some(first) if first == index => Ok(TapOutcome::Cleared),
            Some(first) => {
                store.swap_bibs(first, index)?;
                Ok(TapOutcome::Swapped(first, index))
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FinishTime, Record};

    fn store_with(records: Vec<Record>) -> RecordStore {
        RecordStore::from_records(records)
    }

    #[test]
    fn resolve_keeps_chosen_value_and_persists() {
        let mut store = store_with(vec![
            Record::new(101, FinishTime::Duration(1_000), 205),
            Record::new(300, FinishTime::Duration(2_000), 301),
        ]);
        let mut event = EventData::new();

        let outcome = Resolver::new(&mut store, &mut event)
            .resolve(0, BibChoice::CheckerBib)
            .unwrap();

        assert_eq!(store.get(0), Some(&Record::new(205, FinishTime::Duration(1_000), 205)));
        assert_eq!(event.finish_line_bibs, vec![205]);
        assert_eq!(event.chute_bibs, vec![205]);
        assert_eq!(outcome.remaining, 1);
        assert!(!outcome.submit);
        assert!(outcome.needs_persist());
    }

    #[test]
    fn resolving_last_conflict_requests_submit() {
        let mut store = store_with(vec![Record::new(101, FinishTime::Duration(1_000), 205)]);
        let mut event = EventData::new();

        let outcome = Resolver::new(&mut store, &mut event)
            .resolve(0, BibChoice::BibNum)
            .unwrap();

        assert_eq!(outcome.remaining, 0);
        assert!(outcome.submit);
        assert_eq!(event.chute_bibs, vec![101]);
    }

    #[test]
    fn resolving_clean_place_is_a_no_op() {
        let record = Record::new(7, FinishTime::Duration(1_000), 7);
        let mut store = store_with(vec![record.clone()]);
        let mut event = EventData::new();

        let outcome = Resolver::new(&mut store, &mut event)
            .resolve(0, BibChoice::CheckerBib)
            .unwrap();

        assert_eq!(store.get(0), Some(&record));
        assert_eq!(outcome, ResolveOutcome::default());
        assert_eq!(event, EventData::new());
    }

    #[test]
    fn resolve_out_of_range() {
        let mut store = RecordStore::new();
        let mut event = EventData::new();
        assert_eq!(
            Resolver::new(&mut store, &mut event).resolve(0, BibChoice::BibNum),
            Err(Error::PlaceOutOfRange { place: 1, len: 0 })
        );
    }

    #[test]
    fn batch_use_cloud_and_use_local() {
        let records = vec![
            Record::new(101, FinishTime::Duration(1_000), 201),
            Record::new(102, FinishTime::Duration(2_000), 102),
            Record::new(103, FinishTime::Duration(3_000), 203),
        ];

        let mut store = store_with(records.clone());
        let mut event = EventData::new();
        let outcome = Resolver::new(&mut store, &mut event).resolve_all(BatchDirection::UseCloud);
        assert_eq!(outcome.resolved.len(), 2);
        assert!(outcome.submit);
        assert_eq!(store.get(2).unwrap().checker_bib, Bib::Number(103));
        assert_eq!(event.chute_bibs, vec![101, 0, 103]);

        let mut store = store_with(records);
        let mut event = EventData::new();
        Resolver::new(&mut store, &mut event).resolve_all(BatchDirection::UseLocal);
        assert_eq!(store.get(0).unwrap().bib_num, Bib::Number(201));
        assert_eq!(store.get(1).unwrap().bib_num, Bib::Number(102));
        assert_eq!(store.conflict_count(), 0);
    }

    #[test]
    fn batch_without_conflicts_does_not_submit() {
        let mut store = store_with(vec![Record::new(1, FinishTime::Duration(1), 1)]);
        let mut event = EventData::new();
        let outcome = Resolver::new(&mut store, &mut event).resolve_all(BatchDirection::UseLocal);
        assert!(!outcome.submit);
        assert!(!outcome.needs_persist());
    }

    #[test]
    fn two_taps_swap() {
        let mut store = store_with(vec![
            Record::new(101, FinishTime::Duration(60_000), 101),
            Record::new(102, FinishTime::Duration(120_000), 102),
        ]);
        let mut selection = SwapSelection::new();

        assert_eq!(selection.tap(&mut store, 0), Ok(TapOutcome::Selected(0)));
        assert_eq!(selection.selected(), Some(0));
        assert_eq!(selection.tap(&mut store, 1), Ok(TapOutcome::Swapped(0, 1)));
        assert_eq!(selection.selected(), None);

        assert_eq!(store.get(0), Some(&Record::new(102, FinishTime::Duration(60_000), 102)));
        assert_eq!(store.get(1), Some(&Record::new(101, FinishTime::Duration(120_000), 101)));
    }

    #[test]
    fn tapping_selected_place_clears() {
        let mut store = store_with(vec![Record::new(1, FinishTime::NoTime, 1)]);
        let mut selection = SwapSelection::new();
        selection.tap(&mut store, 0).unwrap();
        assert_eq!(selection.tap(&mut store, 0), Ok(TapOutcome::Cleared));
        assert_eq!(selection.selected(), None);
        assert!(selection.tap(&mut store, 3).is_err());
    }
}

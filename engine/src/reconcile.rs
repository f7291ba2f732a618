//! Reconciliation merge of independently collected finish data.
//!
//! This is the rendezvous point between devices. Given the remote
//! authoritative bib order, a time source and the two local bib arrays, it
//! rebuilds the per-place record set deterministically.
//!
//! # Algorithm
//!
//! 1. Size the record set to the longest bib source (and the time source)
//! 2. Classify each place by which sources have a bib there
//! 3. Fill `bib_num` / `checker_bib` from the highest-priority sources
//! 4. Absorb one-sided bibs so an unset value never reads as a conflict
//! 5. Overwrite finish times by index, tracking the largest recorded time

use crate::{Bib, EventData, FinishTime, RecordStore};
use serde::{Deserialize, Serialize};

/// Where the finish times for a merge come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeSource {
    /// Clock strings from the remote store
    Remote(Vec<String>),
    /// Milliseconds captured on this device
    Local(Vec<u64>),
}

impl Default for TimeSource {
    fn default() -> Self {
        TimeSource::Local(Vec::new())
    }
}

impl TimeSource {
    fn len(&self) -> usize {
        match self {
            TimeSource::Remote(times) => times.len(),
            TimeSource::Local(times) => times.len(),
        }
    }

    fn get(&self, index: usize) -> Option<FinishTime> {
        match self {
            TimeSource::Remote(times) => times.get(index).map(|t| FinishTime::from_input(t)),
            TimeSource::Local(times) => times.get(index).copied().map(FinishTime::Duration),
        }
    }
}

/// Everything the merge reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeInput {
    /// Remote bib order as transmitted (strings)
    pub remote_bibs: Vec<String>,
    /// Bibs typed at the finish line on this device
    pub finish_line_bibs: Vec<u32>,
    /// Bibs scanned in the chute on this device
    pub chute_bibs: Vec<u32>,
    /// Finish times in scope
    pub times: TimeSource,
}

impl MergeInput {
    /// Offline merge: local bib arrays and local finish times.
    pub fn offline(event: &EventData) -> Self {
        Self {
            remote_bibs: Vec::new(),
            finish_line_bibs: event.finish_line_bibs.clone(),
            chute_bibs: event.chute_bibs.clone(),
            times: TimeSource::Local(event.finish_times.clone()),
        }
    }

    /// Online merge: remote bibs and times plus the local bib arrays.
    pub fn online(event: &EventData, remote_bibs: Vec<String>, remote_times: Vec<String>) -> Self {
        Self {
            remote_bibs,
            finish_line_bibs: event.finish_line_bibs.clone(),
            chute_bibs: event.chute_bibs.clone(),
            times: TimeSource::Remote(remote_times),
        }
    }
}

/// Which sources supplied the bibs of a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotSource {
    /// Finish-line and chute bibs from this device
    LocalPair,
    /// Remote bib checked against a local chute bib
    ChuteAndRemote,
    /// Remote bib checked against a local finish-line bib
    FinishLineAndRemote,
    RemoteOnly,
    FinishLineOnly,
    ChuteOnly,
    Empty,
}

/// Result of a merge.
#[derive(Debug)]
pub struct MergeOutcome {
    /// The rebuilt record set
    pub store: RecordStore,
    /// Source classification per place, by index
    pub sources: Vec<SlotSource>,
    /// A remote bib was checked against a local one somewhere
    pub has_remote_data: bool,
    /// Places whose one-sided bib was copied across
    pub absorbed: usize,
    /// Places left in conflict
    pub conflicts: usize,
}

/// Rebuilds a record set from its sources.
pub struct Reconciler {
    input: MergeInput,
}

impl Reconciler {
    pub fn new(input: MergeInput) -> Self {
        Self { input }
    }

    /// Run the merge. The same input always yields the same record set.
    pub fn reconcile(self) -> MergeOutcome {
        let input = self.input;
        let remote_bibs: Vec<Option<u32>> = input
            .remote_bibs
            .iter()
            .map(|raw| Bib::parse(raw).number())
            .collect();

        let places = input
            .chute_bibs
            .len()
            .max(input.finish_line_bibs.len())
            .max(remote_bibs.len());

        let mut store = RecordStore::new();
        let mut sources = Vec::with_capacity(places);
        let mut has_remote_data = false;
        let mut absorbed = 0;

        for index in 0..places {
            store.ensure_len(index + 1);

            let finish_line = nonzero(input.finish_line_bibs.get(index));
            let chute = nonzero(input.chute_bibs.get(index));
            let remote = remote_bibs.get(index).copied().flatten();

            let (source, bib_num, checker_bib) = classify(finish_line, chute, remote);
            if matches!(
                source,
                SlotSource::ChuteAndRemote | SlotSource::FinishLineAndRemote
            ) {
                has_remote_data = true;
            }

            let record = &mut store.records_mut()[index];
            record.bib_num = Bib::from(bib_num);
            record.checker_bib = Bib::from(checker_bib);
            if record.absorb() {
                absorbed += 1;
            }
            sources.push(source);
        }

        for index in 0..input.times.len() {
            store.ensure_len(index + 1);
            if let Some(time) = input.times.get(index) {
                store.records_mut()[index].finish_time = time;
                store.observe_time(time);
            }
        }
        sources.resize(store.len(), SlotSource::Empty);

        let conflicts = store.conflict_count();
        store.notify();

        MergeOutcome {
            store,
            sources,
            has_remote_data,
            absorbed,
            conflicts,
        }
    }
}

fn nonzero(value: Option<&u32>) -> Option<u32> {
    value.copied().filter(|bib| *bib != 0)
}

/// Pick `(source, bib_num, checker_bib)` for one place, zero meaning unset.
///
/// One-sided places keep the other field unset; absorption fills it in.
fn classify(
    finish_line: Option<u32>,
    chute: Option<u32>,
    remote: Option<u32>,
) -> (SlotSource, u32, u32) {
    match (finish_line, chute, remote) {
        (Some(line), Some(chute), _) => (SlotSource::LocalPair, line, chute),
        (_, Some(chute), Some(remote)) => (SlotSource::ChuteAndRemote, remote, chute),
        (Some(line), _, Some(remote)) => (SlotSource::FinishLineAndRemote, remote, line),
        (None, None, Some(remote)) => (SlotSource::RemoteOnly, remote, 0),
        (Some(line), None, None) => (SlotSource::FinishLineOnly, line, 0),
        (None, Some(chute), None) => (SlotSource::ChuteOnly, 0, chute),
        (None, None, None) => (SlotSource::Empty, 0, 0),
    }
}

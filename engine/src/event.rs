//! Events and their locally captured raw data.
//!
//! An event's durable state is three plain arrays (finish-line bibs, chute
//! bibs, finish times), the real start time and two completion flags. The
//! record set is always rebuilt from these by the merge; it is never stored.

use crate::{error::Result, Error, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the event a record set belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EventKey {
    /// An event of a race in the remote results store
    #[serde(rename_all = "camelCase")]
    Race { race_id: u64, event_id: u64 },
    /// An offline session, keyed by its creation time
    #[serde(rename_all = "camelCase")]
    Local { created_at: Timestamp },
}

impl EventKey {
    pub fn race(race_id: u64, event_id: u64) -> Self {
        EventKey::Race { race_id, event_id }
    }

    pub fn local(created_at: Timestamp) -> Self {
        EventKey::Local { created_at }
    }

    /// True for events backed by the remote store.
    pub fn is_online(&self) -> bool {
        matches!(self, EventKey::Race { .. })
    }

    /// Key under which the event's data is persisted locally.
    pub fn storage_key(&self) -> String {
        match self {
            EventKey::Race { race_id, event_id } => format!("race-{race_id}-event-{event_id}"),
            EventKey::Local { created_at } => format!("local-{created_at}"),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.storage_key())
    }
}

/// Raw per-event data as captured on this device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventData {
    /// Real start time (milliseconds since epoch), if started
    pub start_time: Option<Timestamp>,
    /// Finish-line entry was saved
    pub finish_line_done: bool,
    /// Chute entry was saved
    pub chute_done: bool,
    /// Bibs typed at the finish line, by place; zero means none
    pub finish_line_bibs: Vec<u32>,
    /// Bibs scanned in the chute, in arrival order; zero means none
    pub chute_bibs: Vec<u32>,
    /// Finish times in milliseconds since the start, by place
    pub finish_times: Vec<u64>,
    /// Finish-line data was captured on this device's entry screen
    pub finish_line_started: bool,
    /// Chute data was captured on this device's entry screen
    pub chute_started: bool,
}

impl EventData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock. Restarting keeps the original start time.
    pub fn start(&mut self, now: Timestamp) -> Timestamp {
        self.finish_line_started = true;
        *self.start_time.get_or_insert(now)
    }

    pub fn is_started(&self) -> bool {
        self.start_time.is_some()
    }

    /// Milliseconds between the start and `now`.
    pub fn elapsed_since_start(&self, now: Timestamp) -> Option<u64> {
        self.start_time
            .map(|start| u64::try_from(now.saturating_sub(start)).unwrap_or(0))
    }

    /// Stamp the next finish at `now`. Returns the place index.
    pub fn record_finish(&mut self, now: Timestamp) -> Result<usize> {
        let elapsed = self.elapsed_since_start(now).ok_or(Error::NotStarted)?;
        self.finish_times.push(elapsed);
        self.finish_line_started = true;
        Ok(self.finish_times.len() - 1)
    }

    /// Type a bib for the finish-line place at `index`.
    pub fn set_finish_bib(&mut self, index: usize, bib: u32) {
        self.finish_line_started = true;
        set_padded(&mut self.finish_line_bibs, index, bib);
    }

    /// Append the next scanned chute bib. Returns its place index.
    pub fn record_chute_bib(&mut self, bib: u32) -> usize {
        self.chute_bibs.push(bib);
        self.chute_started = true;
        self.chute_bibs.len() - 1
    }

    /// Write a resolved bib into both bib arrays so the next merge agrees.
    ///
    /// This is not entry progress: the gate state is left as it was.
    pub fn persist_resolution(&mut self, index: usize, bib: u32) {
        set_padded(&mut self.finish_line_bibs, index, bib);
        set_padded(&mut self.chute_bibs, index, bib);
    }

    /// Finish-line entry captured data that was not saved yet.
    pub fn has_finish_line_progress(&self) -> bool {
        self.finish_line_started && !self.finish_line_done
    }

    /// Chute entry captured data that was not saved yet.
    pub fn has_chute_progress(&self) -> bool {
        self.chute_started && !self.chute_done
    }

    /// Drop the raw arrays and start time once the remote copy is authoritative.
    pub fn clear_progress(&mut self) {
        self.start_time = None;
        self.finish_line_bibs.clear();
        self.chute_bibs.clear();
        self.finish_times.clear();
        self.finish_line_started = false;
        self.chute_started = false;
    }

    pub fn set_done(&mut self, done: bool) {
        self.finish_line_done = done;
        self.chute_done = done;
    }
}

fn set_padded(values: &mut Vec<u32>, index: usize, value: u32) {
    if values.len() <= index {
        values.resize(index + 1, 0);
    }
    values[index] = value;
}

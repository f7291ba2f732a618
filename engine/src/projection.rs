//! Plain-array projection of a record set.
//!
//! Record sets are never persisted as tuples. A commit writes them as three
//! parallel arrays, which is also what the remote store receives.

use crate::{format_clock_time, EventData, Record};
use serde::{Deserialize, Serialize};

/// The arrays a record set is committed as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    /// Authoritative bib per place
    pub bib_nums: Vec<u32>,
    /// Checker bib per place
    pub checker_bibs: Vec<u32>,
    /// Recorded finish times, in place order, without unrecorded places
    pub finish_times: Vec<u64>,
}

impl Projection {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            bib_nums: records.iter().map(|r| r.bib_num.raw()).collect(),
            checker_bibs: records.iter().map(|r| r.checker_bib.raw()).collect(),
            finish_times: records
                .iter()
                .filter_map(|r| r.finish_time.millis())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bib_nums.is_empty()
    }

    /// Finish times as clock strings, for upload.
    pub fn clock_times(&self) -> Vec<String> {
        self.finish_times
            .iter()
            .map(|ms| format_clock_time(*ms))
            .collect()
    }

    /// Overwrite an event's raw arrays with this projection.
    pub fn apply_to(&self, event: &mut EventData) {
        event.finish_line_bibs = self.bib_nums.clone();
        event.chute_bibs = self.checker_bibs.clone();
        event.finish_times = self.finish_times.clone();
    }
}

//! Pre-commit validation of a record set.
//!
//! Rules are checked one at a time over every place, in a fixed order; the
//! first rule that any place breaks is the one reported.

use crate::{record::has_leading_zero, Bib, EngineConfig, FinishTime, RecordStore};
use thiserror::Error;

/// The first problem found in a record set. `place` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("place {place} has no bib number")]
    BlankBib { place: usize },

    #[error("place {place} has a bib that is not a number: '{bib}'")]
    NonNumericBib { place: usize, bib: String },

    #[error("place {place} has a bib with a leading zero: '{bib}'")]
    LeadingZeroBib { place: usize, bib: String },

    #[error("place {place} has no finish time but a later place does")]
    MissingTime { place: usize },

    #[error("place {place} has an unreadable finish time")]
    InvalidTime { place: usize },

    #[error("place {place} has a finish time of {time}, longer than the event allows")]
    TimeTooLong { place: usize, time: String },

    #[error("place {place} has a finish time of zero")]
    ZeroTime { place: usize },
}

impl ValidationError {
    /// 1-based place the error refers to.
    pub fn place(&self) -> usize {
        match self {
            ValidationError::BlankBib { place }
            | ValidationError::NonNumericBib { place, .. }
            | ValidationError::LeadingZeroBib { place, .. }
            | ValidationError::MissingTime { place }
            | ValidationError::InvalidTime { place }
            | ValidationError::TimeTooLong { place, .. }
            | ValidationError::ZeroTime { place } => *place,
        }
    }
}

/// Sort the record set by finish time, normalize it and check it.
///
/// The stable sort is applied to the store itself, so ranks after a
/// successful check are the ranks that get committed.
pub fn check_entries(
    store: &mut RecordStore,
    config: &EngineConfig,
) -> Result<(), ValidationError> {
    store.batch(|records| {
        records.sort_by_key(|r| r.finish_time);
        for record in records.iter_mut() {
            if !record.bib_num.is_set() || !record.checker_bib.is_set() {
                record.bib_num = Bib::Unset;
                record.checker_bib = Bib::Unset;
            }
        }
    });

    let records = store.records();
    let places = records.len();

    first_broken(places, |i| {
        (!records[i].bib_num.is_set()).then_some(ValidationError::BlankBib { place: i + 1 })
    })?;

    first_broken(places, |i| match &records[i].bib_num {
        Bib::Text(bib) if !has_leading_zero(bib) => Some(ValidationError::NonNumericBib {
            place: i + 1,
            bib: bib.clone(),
        }),
        _ => None,
    })?;

    first_broken(places, |i| match &records[i].bib_num {
        Bib::Text(bib) => Some(ValidationError::LeadingZeroBib {
            place: i + 1,
            bib: bib.clone(),
        }),
        _ => None,
    })?;

    let last_timed = records.iter().rposition(|r| !r.finish_time.is_missing());
    first_broken(places, |i| {
        let gap = records[i].finish_time.is_missing() && last_timed.is_some_and(|last| i < last);
        gap.then_some(ValidationError::MissingTime { place: i + 1 })
    })?;

    first_broken(places, |i| {
        (records[i].finish_time == FinishTime::Invalid)
            .then_some(ValidationError::InvalidTime { place: i + 1 })
    })?;

    first_broken(places, |i| match records[i].finish_time {
        FinishTime::Duration(ms) if ms > config.max_event_duration_ms => {
            Some(ValidationError::TimeTooLong {
                place: i + 1,
                time: records[i].finish_time.to_string(),
            })
        }
        _ => None,
    })?;

    first_broken(places, |i| {
        (records[i].finish_time == FinishTime::Duration(0))
            .then_some(ValidationError::ZeroTime { place: i + 1 })
    })
}

/// Report the first place for which `broken` yields an error.
fn first_broken(
    places: usize,
    broken: impl Fn(usize) -> Option<ValidationError>,
) -> Result<(), ValidationError> {
    (0..places).find_map(broken).map_or(Ok(()), Err)
}

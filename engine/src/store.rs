//! Record store - the ordered, per-place record set of one session.
//!
//! The store owns a single `Vec<Record>`; a record's index is its finish rank.
//! Mutations go through [`RecordStore::batch`] (or an editing method built on
//! it), which notifies every subscribed observer exactly once afterwards.

use crate::{
    conflict::{conflicting_indices, count_conflicts},
    error::Result,
    Bib, Error, FinishTime, Record,
};
use std::fmt;

/// Handle returned by [`RecordStore::subscribe`].
pub type ObserverId = usize;

type Observer = Box<dyn FnMut(&[Record]) + Send>;

/// The ordered record set for one reconciliation session.
#[derive(Default)]
pub struct RecordStore {
    records: Vec<Record>,
    /// Largest recorded finish time seen so far
    max_time: Option<u64>,
    observers: Vec<(ObserverId, Observer)>,
    next_observer: ObserverId,
}

impl fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStore")
            .field("records", &self.records)
            .field("max_time", &self.max_time)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `records`.
    pub fn from_records(records: Vec<Record>) -> Self {
        let max_time = records.iter().filter_map(|r| r.finish_time.millis()).max();
        Self {
            records,
            max_time,
            ..Self::default()
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest recorded finish time seen by this store.
    pub fn max_time(&self) -> Option<u64> {
        self.max_time
    }

    /// Number of places whose bibs disagree.
    pub fn conflict_count(&self) -> usize {
        count_conflicts(&self.records)
    }

    /// Indices of places whose bibs disagree.
    pub fn conflicts(&self) -> Vec<usize> {
        conflicting_indices(&self.records)
    }

    /// Register an observer, called with the full record set after each batch.
    pub fn subscribe(&mut self, observer: impl FnMut(&[Record]) + Send + 'static) -> ObserverId {
        let id = self.next_observer;
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    /// Publish the current record set to every observer.
    pub fn notify(&mut self) {
        let records = &self.records;
        for (_, observer) in &mut self.observers {
            observer(records);
        }
    }

    /// Apply a mutation to the record set, then notify observers once.
    pub fn batch<R>(&mut self, mutate: impl FnOnce(&mut Vec<Record>) -> R) -> R {
        let result = mutate(&mut self.records);
        self.refresh_max_time();
        self.notify();
        result
    }

    /// Grow the record set with blank records until it holds `len` places.
    /// Does not notify.
    pub(crate) fn ensure_len(&mut self, len: usize) {
        if self.records.len() < len {
            self.records.resize_with(len, Record::default);
        }
    }

    /// Direct access for in-crate passes that notify on their own.
    pub(crate) fn records_mut(&mut self) -> &mut Vec<Record> {
        &mut self.records
    }

    pub(crate) fn observe_time(&mut self, time: FinishTime) {
        if let Some(ms) = time.millis() {
            self.max_time = Some(self.max_time.map_or(ms, |max| max.max(ms)));
        }
    }

    fn refresh_max_time(&mut self) {
        let current = self.records.iter().filter_map(|r| r.finish_time.millis()).max();
        self.max_time = match (self.max_time, current) {
            (Some(seen), Some(now)) => Some(seen.max(now)),
            (seen, now) => seen.or(now),
        };
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(Error::PlaceOutOfRange {
                place: index + 1,
                len: self.records.len(),
            })
        }
    }

    /// Set both bibs at `index` from operator input.
    pub fn edit_bib(&mut self, index: usize, text: &str) -> Result<()> {
        self.check_index(index)?;
        let bib = Bib::parse(text);
        self.batch(|records| records[index].settle(bib));
        Ok(())
    }

    /// Set the finish time at `index` from operator input.
    pub fn edit_time(&mut self, index: usize, text: &str) -> Result<FinishTime> {
        self.check_index(index)?;
        let time = FinishTime::from_input(text);
        self.batch(|records| records[index].finish_time = time);
        Ok(time)
    }

    /// Append a blank place that sorts after every recorded time.
    ///
    /// Returns the index of the new place.
    pub fn add_record(&mut self) -> usize {
        let finish_time = match self.max_time {
            Some(max) => FinishTime::Duration(max + 1),
            None => FinishTime::NoTime,
        };
        self.batch(|records| {
            records.push(Record {
                finish_time,
                ..Record::default()
            });
            records.len() - 1
        })
    }

    /// Remove the place at `index`; later places move up one rank.
    pub fn remove_record(&mut self, index: usize) -> Result<Record> {
        self.check_index(index)?;
        Ok(self.batch(|records| records.remove(index)))
    }

    /// Exchange the bib pairs of two places, leaving their times in place.
    pub fn swap_bibs(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_index(a)?;
        self.check_index(b)?;
        if a == b {
            return Ok(());
        }
        self.batch(|records| {
            let (low, high) = (a.min(b), a.max(b));
            let (head, tail) = records.split_at_mut(high);
            let (first, second) = (&mut head[low], &mut tail[0]);
            std::mem::swap(&mut first.bib_num, &mut second.bib_num);
            std::mem::swap(&mut first.checker_bib, &mut second.checker_bib);
        });
        Ok(())
    }

    /// Remove every place.
    pub fn clear(&mut self) {
        self.batch(|records| records.clear());
        self.max_time = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn two_places() -> RecordStore {
        RecordStore::from_records(vec![
            Record::new(101, FinishTime::Duration(60_000), 101),
            Record::new(102, FinishTime::Duration(120_000), 102),
        ])
    }

    #[test]
    fn batch_notifies_once() {
        let mut store = two_places();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        store.subscribe(move |records| sink.lock().unwrap().push(records.len()));

        store.batch(|records| {
            records.push(Record::default());
            records.push(Record::default());
        });

        assert_eq!(*seen.lock().unwrap(), vec![4]);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = two_places();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = store.subscribe(move |_| *sink.lock().unwrap() += 1);

        store.notify();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.notify();

        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn swap_exchanges_bibs_not_times() {
        let mut store = two_places();
        store.swap_bibs(0, 1).unwrap();

        assert_eq!(store.get(0), Some(&Record::new(102, FinishTime::Duration(60_000), 102)));
        assert_eq!(store.get(1), Some(&Record::new(101, FinishTime::Duration(120_000), 101)));
    }

    #[test]
    fn swap_out_of_range() {
        let mut store = two_places();
        assert_eq!(
            store.swap_bibs(0, 5),
            Err(Error::PlaceOutOfRange { place: 6, len: 2 })
        );
    }

    #[test]
    fn add_record_sorts_after_max_time() {
        let mut store = two_places();
        let index = store.add_record();
        assert_eq!(index, 2);
        assert_eq!(store.get(2).unwrap().finish_time, FinishTime::Duration(120_001));
        assert_eq!(store.max_time(), Some(120_001));

        let mut empty = RecordStore::new();
        empty.add_record();
        assert_eq!(empty.get(0).unwrap().finish_time, FinishTime::NoTime);
    }

    #[test]
    fn edit_bib_settles_both_fields() {
        let mut store = RecordStore::from_records(vec![Record::new(
            101,
            FinishTime::Duration(1_000),
            205,
        )]);
        store.edit_bib(0, "205").unwrap();
        assert_eq!(store.conflict_count(), 0);
        assert_eq!(store.get(0).unwrap().bib_num, Bib::Number(205));
    }

    #[test]
    fn edit_time_parses_input() {
        let mut store = two_places();
        assert_eq!(store.edit_time(0, "0:30").unwrap(), FinishTime::Duration(30_000));
        assert_eq!(store.edit_time(1, "later").unwrap(), FinishTime::Invalid);
        assert_eq!(store.edit_time(1, "").unwrap(), FinishTime::NoTime);
    }

    #[test]
    fn remove_shifts_ranks() {
        let mut store = two_places();
        let removed = store.remove_record(0).unwrap();
        assert_eq!(removed.bib_num, Bib::Number(101));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(0).unwrap().bib_num, Bib::Number(102));
    }

    #[test]
    fn clear_resets_max_time() {
        let mut store = two_places();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.max_time(), None);
    }
}

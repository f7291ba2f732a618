//! In-process remote store, for offline demos and tests.

use super::{BibEntry, Participant, RemoteStore, TimeEntry};
use crate::error::RemoteError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// A remote call, for failure injection and call logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCall {
    GetBibs,
    GetFinishTimes,
    GetParticipants,
    PostBibs,
    PostFinishTimes,
    DeleteBibs,
    DeleteFinishTimes,
}

#[derive(Debug, Default)]
struct EventState {
    bibs: Vec<String>,
    times: Vec<String>,
    participants: Vec<Participant>,
}

/// Remote store kept in memory. Posts append and deletes clear, like the
/// service it stands in for.
#[derive(Debug, Default)]
pub struct InMemoryRemote {
    events: Mutex<HashMap<(u64, u64), EventState>>,
    failures: Mutex<HashMap<RemoteCall, RemoteError>>,
    one_shot: Mutex<HashMap<RemoteCall, RemoteError>>,
    calls: Mutex<Vec<RemoteCall>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_bibs(&self, race_id: u64, event_id: u64, bibs: &[&str]) {
        self.with_event(race_id, event_id, |state| {
            state.bibs = bibs.iter().map(|b| b.to_string()).collect();
        });
    }

    pub fn seed_times(&self, race_id: u64, event_id: u64, times: &[&str]) {
        self.with_event(race_id, event_id, |state| {
            state.times = times.iter().map(|t| t.to_string()).collect();
        });
    }

    pub fn seed_participants(&self, race_id: u64, event_id: u64, participants: Vec<Participant>) {
        self.with_event(race_id, event_id, |state| state.participants = participants);
    }

    /// Make every `call` fail with `error` until [`InMemoryRemote::heal`].
    pub fn fail(&self, call: RemoteCall, error: RemoteError) {
        lock(&self.failures).insert(call, error);
    }

    /// Make only the next `call` fail.
    pub fn fail_once(&self, call: RemoteCall, error: RemoteError) {
        lock(&self.one_shot).insert(call, error);
    }

    pub fn heal(&self, call: RemoteCall) {
        lock(&self.failures).remove(&call);
        lock(&self.one_shot).remove(&call);
    }

    /// Every call made so far, in order, including failed ones.
    pub fn calls(&self) -> Vec<RemoteCall> {
        lock(&self.calls).clone()
    }

    pub fn bibs(&self, race_id: u64, event_id: u64) -> Vec<String> {
        self.with_event(race_id, event_id, |state| state.bibs.clone())
    }

    pub fn times(&self, race_id: u64, event_id: u64) -> Vec<String> {
        self.with_event(race_id, event_id, |state| state.times.clone())
    }

    fn enter(&self, call: RemoteCall) -> Result<(), RemoteError> {
        lock(&self.calls).push(call);
        if let Some(error) = lock(&self.one_shot).remove(&call) {
            return Err(error);
        }
        match lock(&self.failures).get(&call) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn with_event<T>(
        &self,
        race_id: u64,
        event_id: u64,
        f: impl FnOnce(&mut EventState) -> T,
    ) -> T {
        f(lock(&self.events).entry((race_id, event_id)).or_default())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemote {
    async fn get_bibs(&self, race_id: u64, event_id: u64) -> Result<Vec<BibEntry>, RemoteError> {
        self.enter(RemoteCall::GetBibs)?;
        Ok(self.with_event(race_id, event_id, |state| {
            state
                .bibs
                .iter()
                .map(|bib_num| BibEntry {
                    bib_num: bib_num.clone(),
                })
                .collect()
        }))
    }

    async fn get_finish_times(
        &self,
        race_id: u64,
        event_id: u64,
    ) -> Result<Vec<TimeEntry>, RemoteError> {
        self.enter(RemoteCall::GetFinishTimes)?;
        Ok(self.with_event(race_id, event_id, |state| {
            state
                .times
                .iter()
                .map(|time| TimeEntry { time: time.clone() })
                .collect()
        }))
    }

    async fn get_participants(
        &self,
        race_id: u64,
        event_id: u64,
    ) -> Result<Vec<Participant>, RemoteError> {
        self.enter(RemoteCall::GetParticipants)?;
        Ok(self.with_event(race_id, event_id, |state| state.participants.clone()))
    }

    async fn post_bibs(
        &self,
        race_id: u64,
        event_id: u64,
        bibs: &[u32],
    ) -> Result<(), RemoteError> {
        self.enter(RemoteCall::PostBibs)?;
        self.with_event(race_id, event_id, |state| {
            state.bibs.extend(bibs.iter().map(|b| b.to_string()))
        });
        Ok(())
    }

    async fn post_finish_times(
        &self,
        race_id: u64,
        event_id: u64,
        times: &[String],
    ) -> Result<(), RemoteError> {
        self.enter(RemoteCall::PostFinishTimes)?;
        self.with_event(race_id, event_id, |state| {
            state.times.extend(times.iter().cloned())
        });
        Ok(())
    }

    async fn delete_bibs(&self, race_id: u64, event_id: u64) -> Result<(), RemoteError> {
        self.enter(RemoteCall::DeleteBibs)?;
        self.with_event(race_id, event_id, |state| state.bibs.clear());
        Ok(())
    }

    async fn delete_finish_times(&self, race_id: u64, event_id: u64) -> Result<(), RemoteError> {
        self.enter(RemoteCall::DeleteFinishTimes)?;
        self.with_event(race_id, event_id, |state| state.times.clear());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posts_append_and_deletes_clear() {
        let remote = InMemoryRemote::new();
        remote.post_bibs(1, 2, &[5, 6]).await.unwrap();
        remote.post_bibs(1, 2, &[7]).await.unwrap();
        assert_eq!(remote.bibs(1, 2), vec!["5", "6", "7"]);

        remote.delete_bibs(1, 2).await.unwrap();
        assert!(remote.get_bibs(1, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_until_healed() {
        let remote = InMemoryRemote::new();
        remote.fail(RemoteCall::GetFinishTimes, RemoteError::Timeout);
        assert_eq!(remote.get_finish_times(1, 1).await, Err(RemoteError::Timeout));

        remote.heal(RemoteCall::GetFinishTimes);
        assert_eq!(remote.get_finish_times(1, 1).await, Ok(vec![]));
        assert_eq!(
            remote.calls(),
            vec![RemoteCall::GetFinishTimes, RemoteCall::GetFinishTimes]
        );
    }

    #[tokio::test]
    async fn one_shot_failure() {
        let remote = InMemoryRemote::new();
        remote.fail_once(RemoteCall::PostBibs, RemoteError::Unreachable);
        assert_eq!(remote.post_bibs(1, 1, &[3]).await, Err(RemoteError::Unreachable));
        assert_eq!(remote.post_bibs(1, 1, &[3]).await, Ok(()));
        assert_eq!(remote.bibs(1, 1), vec!["3"]);
    }
}

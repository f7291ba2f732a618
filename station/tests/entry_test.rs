//! Integration tests for finish-line and chute entry.

use finishline_engine::{Error, EventKey, GateBlock, Mode, ModeState};
use finishline_station::remote::RemoteCall;
use finishline_station::storage::LocalStorage;
use finishline_station::{
    create_local_event, CollectingReporter, EntrySession, InMemoryRemote, JsonFileStorage,
    MemoryStorage, ReconcileSession, RemoteError, ScriptedConfirmer, Station, StationError,
};
use std::sync::Arc;

fn offline_station(storage: Arc<dyn LocalStorage>) -> Station {
    Station::new(
        storage,
        Arc::new(CollectingReporter::new()),
        Arc::new(ScriptedConfirmer::default()),
    )
}

#[cfg(test)]
mod offline_tests {
    use super::*;

    #[tokio::test]
    async fn finish_line_then_chute_then_results() {
        let dir = tempfile::tempdir().unwrap();
        let station = offline_station(Arc::new(JsonFileStorage::new(dir.path())));
        let key = create_local_event(&station).await.unwrap();

        let mut entry = EntrySession::open(&station, key.clone(), Mode::FinishLine)
            .await
            .unwrap();
        assert_eq!(entry.state(), ModeState::InProgress);
        entry.start();
        let place = entry.record_finish().unwrap();
        entry.set_finish_bib(place, 101);
        entry.save().await.unwrap();
        let event = entry.finish().await.unwrap();
        assert!(event.finish_line_done);
        assert_eq!(event.finish_line_bibs, vec![101]);

        let mut chute = EntrySession::open(&station, key.clone(), Mode::Chute)
            .await
            .unwrap();
        chute.record_chute_bib(205);
        chute.finish().await.unwrap();

        let session = ReconcileSession::open(&station, key).await.unwrap();
        assert_eq!(session.conflicts(), vec![0]);
    }

    #[tokio::test]
    async fn chute_waits_for_finish_line_offline() {
        let station = offline_station(Arc::new(MemoryStorage::new()));
        let key = create_local_event(&station).await.unwrap();

        let err = EntrySession::open(&station, key, Mode::Chute)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StationError::Engine(Error::Gate(GateBlock::FinishLineNotDone))
        ));
    }

    #[tokio::test]
    async fn finish_requires_a_started_clock() {
        let station = offline_station(Arc::new(MemoryStorage::new()));
        let key = create_local_event(&station).await.unwrap();
        let mut entry = EntrySession::open(&station, key, Mode::FinishLine)
            .await
            .unwrap();

        assert!(matches!(
            entry.record_finish(),
            Err(StationError::Engine(Error::NotStarted))
        ));
    }

    #[tokio::test]
    async fn done_mode_cannot_be_reentered() {
        let station = offline_station(Arc::new(MemoryStorage::new()));
        let key = create_local_event(&station).await.unwrap();
        let entry = EntrySession::open(&station, key.clone(), Mode::FinishLine)
            .await
            .unwrap();
        entry.finish().await.unwrap();

        let err = EntrySession::open(&station, key, Mode::FinishLine)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StationError::Engine(Error::Gate(GateBlock::FinishLineDone))
        ));
    }
}

#[cfg(test)]
mod online_tests {
    use super::*;

    fn online_station(remote: Arc<InMemoryRemote>) -> (Station, Arc<CollectingReporter>) {
        let reporter = Arc::new(CollectingReporter::new());
        let station = Station::new(
            Arc::new(MemoryStorage::new()),
            reporter.clone(),
            Arc::new(ScriptedConfirmer::default()),
        )
        .with_remote(remote);
        (station, reporter)
    }

    #[tokio::test]
    async fn finish_line_blocked_once_times_are_uploaded() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.seed_times(1, 1, &["00:00:30.00"]);
        let (station, _) = online_station(remote);

        let err = EntrySession::open(&station, EventKey::race(1, 1), Mode::FinishLine)
            .await
            .err()
            .unwrap();
        assert!(matches!(
            err,
            StationError::Engine(Error::Gate(GateBlock::RemoteHasTimes))
        ));
    }

    #[tokio::test]
    async fn chute_allowed_online_before_finish_line() {
        let remote = Arc::new(InMemoryRemote::new());
        let (station, _) = online_station(remote);

        let entry = EntrySession::open(&station, EventKey::race(1, 1), Mode::Chute)
            .await
            .unwrap();
        assert_eq!(entry.state(), ModeState::InProgress);
    }

    #[tokio::test]
    async fn finish_line_save_uploads_times() {
        let remote = Arc::new(InMemoryRemote::new());
        let (station, _) = online_station(remote.clone());

        let mut entry = EntrySession::open(&station, EventKey::race(1, 1), Mode::FinishLine)
            .await
            .unwrap();
        entry.start();
        entry.record_finish().unwrap();
        entry.record_finish().unwrap();
        entry.set_finish_bib(1, 7);
        entry.finish().await.unwrap();

        assert_eq!(remote.times(1, 1).len(), 2);
        assert_eq!(remote.bibs(1, 1), vec!["0", "7"]);
    }

    #[tokio::test]
    async fn failed_upload_keeps_mode_open() {
        let remote = Arc::new(InMemoryRemote::new());
        remote.fail(RemoteCall::PostFinishTimes, RemoteError::Unreachable);
        let (station, reporter) = online_station(remote);
        let key = EventKey::race(1, 1);

        let mut entry = EntrySession::open(&station, key.clone(), Mode::FinishLine)
            .await
            .unwrap();
        entry.start();
        entry.record_finish().unwrap();
        let err = entry.finish().await.unwrap_err();

        assert!(err.is_unreachable());
        assert_eq!(reporter.drain().len(), 1);
        let stored = station.storage().load_event(&key).await.unwrap();
        assert!(stored.map_or(true, |event| !event.finish_line_done));
    }
}

//! Finishline Station - reconcile and save an offline event from the command line.
//!
//! Opens the local event named by `FINISHLINE_EVENT`, merges its finish-line
//! and chute data, logs the record set and any conflicts, and saves it when
//! there is nothing left to resolve.

use finishline_engine::{format_clock_time, EventKey};
use finishline_station::{
    Config, JsonFileStorage, ReconcileSession, ScriptedConfirmer, Station, StationError,
    TracingReporter,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finishline_station=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    let key = EventKey::local(config.require_event()?);

    tracing::info!("Opening {} from {}", key, config.data_dir.display());

    // No prompts are answered on the command line
    let station = Station::new(
        Arc::new(JsonFileStorage::new(&config.data_dir)),
        Arc::new(TracingReporter),
        Arc::new(ScriptedConfirmer::default()),
    )
    .with_engine_config(config.engine());

    let mut session = ReconcileSession::open(&station, key).await?;

    for (index, record) in session.records().iter().enumerate() {
        let time = record
            .finish_time
            .millis()
            .map(format_clock_time)
            .unwrap_or_default();
        tracing::info!(
            "{:>4}  {:>6}  {:>6}  {}",
            index + 1,
            record.bib_num.to_string(),
            record.checker_bib.to_string(),
            time
        );
    }

    let conflicts = session.conflicts();
    if !conflicts.is_empty() {
        let places: Vec<String> = conflicts.iter().map(|i| (i + 1).to_string()).collect();
        tracing::warn!(
            "{} conflicts must be resolved before saving (places {})",
            conflicts.len(),
            places.join(", ")
        );
        return Ok(());
    }

    match session.commit().await {
        Ok(outcome) => tracing::info!("Saved: {:?}", outcome),
        Err(err @ StationError::Engine(_)) => tracing::warn!("Not saved: {}", err),
        Err(err) => return Err(err.into()),
    }

    Ok(())
}

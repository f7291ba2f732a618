//! # Finishline Engine
//!
//! Record reconciliation for field race timing.
//!
//! Independent operators capture finish data on separate devices: a
//! finish-line operator stamps times and types bibs, a chute operator scans
//! bibs in arrival order. This crate merges those streams (and whatever the
//! remote results store already holds) into one record per finish place,
//! detects where the two bib sources disagree, and resolves, validates and
//! projects the result for commit.
//!
//! ## Design Principles
//!
//! - **No IO**: network and storage live in the station crate
//! - **Deterministic**: the same sources always merge to the same record set
//! - **Typed sentinels**: "no time" and "invalid time" are enum variants, not
//!   magic integers
//!
//! ## Core Concepts
//!
//! - [`Record`] - `(bib_num, finish_time, checker_bib)` for one place; its
//!   index in the [`RecordStore`] is its rank
//! - [`Reconciler`] - index-aligned merge of remote and local sources
//! - [`Resolver`] - single and batch conflict resolution, persisted back into
//!   the event's raw arrays
//! - [`check_entries`] - ordered pre-commit validation
//! - [`ModeGate`] - which entry screen may be opened next
//!
//! ## Quick Start
//!
//! ```rust
//! use finishline_engine::{
//!     BibChoice, EventData, MergeInput, Reconciler, Resolver,
//! };
//!
//! let mut event = EventData::new();
//! event.start(0);
//! event.record_finish(61_000).unwrap();
//! event.set_finish_bib(0, 101);
//! event.record_chute_bib(205);
//!
//! let mut outcome = Reconciler::new(MergeInput::offline(&event)).reconcile();
//! assert_eq!(outcome.conflicts, 1);
//!
//! let resolved = Resolver::new(&mut outcome.store, &mut event)
//!     .resolve(0, BibChoice::CheckerBib)
//!     .unwrap();
//! assert!(resolved.submit);
//! assert_eq!(event.finish_line_bibs, vec![205]);
//! ```

pub mod config;
pub mod conflict;
pub mod error;
pub mod event;
pub mod gating;
pub mod projection;
pub mod reconcile;
pub mod record;
pub mod resolve;
pub mod store;
pub mod time;
pub mod validate;

// Re-export main types at crate root
pub use config::EngineConfig;
pub use conflict::{count_conflicts, is_conflict, ConflictAlert, ConflictMonitor};
pub use error::Error;
pub use event::{EventData, EventKey};
pub use gating::{GateBlock, Mode, ModeGate, ModeState, Screen};
pub use projection::Projection;
pub use reconcile::{MergeInput, MergeOutcome, Reconciler, SlotSource, TimeSource};
pub use record::{Bib, Record};
pub use resolve::{
    BatchDirection, BibChoice, Resolution, ResolveOutcome, Resolver, SwapSelection, TapOutcome,
};
pub use store::{ObserverId, RecordStore};
pub use time::{format_clock_time, parse_clock_time, FinishTime};
pub use validate::{check_entries, ValidationError};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

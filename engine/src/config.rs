//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Longest finish time the clock codec can show without wrapping.
pub const DEFAULT_MAX_EVENT_DURATION_MS: u64 = 86_399_999;

/// Tunables for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Finish times above this are rejected
    pub max_event_duration_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_event_duration_ms: DEFAULT_MAX_EVENT_DURATION_MS,
        }
    }
}

//! Unified error handling for the station.

use finishline_engine::ValidationError;

/// Failure of a call to the remote results store.
///
/// Timeouts are enforced by the HTTP layer and handled like any other
/// failure; only `Unreachable` gets its own user message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("network unreachable")]
    Unreachable,

    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Failed(String),
}

/// Station error type.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Engine(#[from] finishline_engine::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StationError {
    /// The device could not reach the remote store at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StationError::Remote(RemoteError::Unreachable))
    }

    /// The validation failure behind this error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            StationError::Engine(finishline_engine::Error::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for StationError {
    fn from(err: ValidationError) -> Self {
        StationError::Engine(err.into())
    }
}

impl From<finishline_engine::GateBlock> for StationError {
    fn from(block: finishline_engine::GateBlock) -> Self {
        StationError::Engine(block.into())
    }
}

/// Result type alias for station operations.
pub type Result<T> = std::result::Result<T, StationError>;

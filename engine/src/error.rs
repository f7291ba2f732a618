//! Error types for the finishline engine.

use crate::{GateBlock, ValidationError};
use thiserror::Error;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Record set errors
    #[error("place {place} does not exist ({len} places)")]
    PlaceOutOfRange { place: usize, len: usize },

    #[error("{0} conflicts must be resolved first")]
    OpenConflicts(usize),

    #[error("resolving every conflict at once needs remote data")]
    BatchUnavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Event errors
    #[error("the event has not been started")]
    NotStarted,

    #[error("entry blocked: {0}")]
    Gate(#[from] GateBlock),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::PlaceOutOfRange { place: 4, len: 3 };
        assert_eq!(err.to_string(), "place 4 does not exist (3 places)");

        let err = Error::from(ValidationError::BlankBib { place: 1 });
        assert_eq!(err.to_string(), "place 1 has no bib number");

        let err = Error::from(GateBlock::ChuteInProgress);
        assert_eq!(err.to_string(), "entry blocked: chute entry is in progress");

        let err = Error::OpenConflicts(2);
        assert_eq!(err.to_string(), "2 conflicts must be resolved first");
    }
}

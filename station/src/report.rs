//! Error reporting to logs and to the operator.

use crate::error::StationError;
use std::sync::Mutex;

/// Shown for any failure caused by the device being offline.
pub const CONNECTIVITY_MESSAGE: &str =
    "Could not reach the results server. Check your connection and try again.";

/// The message an operator sees for `error` raised while `context`.
///
/// Validation and other engine errors name the offending place and are shown
/// as-is; anything else is generic and names the operation.
pub fn user_message(context: &str, error: &StationError) -> String {
    match error {
        _ if error.is_unreachable() => CONNECTIVITY_MESSAGE.to_string(),
        StationError::Engine(err) => err.to_string(),
        _ => format!("Something went wrong while {context}. Please try again."),
    }
}

/// Where failures go.
pub trait ErrorReporter: Send + Sync {
    /// Report a failure raised while `context`. When `user_visible` is set
    /// the operator should see [`user_message`].
    fn report(&self, context: &str, error: &StationError, user_visible: bool);
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, context: &str, error: &StationError, user_visible: bool) {
        if user_visible {
            tracing::warn!(
                context,
                error = %error,
                message = %user_message(context, error),
                "Reported failure"
            );
        } else {
            tracing::error!(context, error = %error, "Failure while {}", context);
        }
    }
}

/// A report kept by [`CollectingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub context: String,
    pub message: String,
    pub user_visible: bool,
}

/// Keeps every report in memory, for tests and for UIs that drain them.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<Report>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything reported so far.
    pub fn drain(&self) -> Vec<Report> {
        match self.reports.lock() {
            Ok(mut reports) => std::mem::take(&mut *reports),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, context: &str, error: &StationError, user_visible: bool) {
        tracing::debug!(context, error = %error, "Collected report");
        let report = Report {
            context: context.to_string(),
            message: user_message(context, error),
            user_visible,
        };
        match self.reports.lock() {
            Ok(mut reports) => reports.push(report),
            Err(poisoned) => poisoned.into_inner().push(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use finishline_engine::ValidationError;

    #[test]
    fn unreachable_gets_connectivity_message() {
        let err = StationError::from(RemoteError::Unreachable);
        assert_eq!(user_message("loading results", &err), CONNECTIVITY_MESSAGE);
    }

    #[test]
    fn validation_names_the_place() {
        let err = StationError::from(ValidationError::BlankBib { place: 4 });
        assert_eq!(user_message("saving results", &err), "place 4 has no bib number");
    }

    #[test]
    fn other_failures_name_the_operation() {
        let err = StationError::from(RemoteError::Timeout);
        assert_eq!(
            user_message("saving results", &err),
            "Something went wrong while saving results. Please try again."
        );
    }

    #[test]
    fn collecting_reporter_drains() {
        let reporter = CollectingReporter::new();
        reporter.report("loading results", &RemoteError::Unreachable.into(), true);

        let reports = reporter.drain();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].message, CONNECTIVITY_MESSAGE);
        assert!(reporter.drain().is_empty());
    }
}

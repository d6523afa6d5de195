//! Logging configuration and request diagnostics for eduapi.
//!
//! [`init_logging`] installs the tracing subscriber used by the binary.
//! [`DiagnosticSink`] receives one record per dispatched request; the default
//! [`TracingDiagnostics`] turns each record into a structured tracing event.

use std::sync::Mutex;

use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::classify::Outcome;

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Suppress all output except errors.
    Quiet,
    /// Normal output level (info and above).
    #[default]
    Normal,
    /// Verbose output (debug and above).
    Verbose,
    /// Very verbose output (trace level).
    Trace,
}

impl Verbosity {
    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Initialize the logging system.
///
/// This should be called once at application startup. The logging level can be
/// controlled via:
/// 1. The `verbosity` parameter
/// 2. The `RUST_LOG` environment variable (takes precedence)
///
/// # Examples
///
/// ```no_run
/// use eduapi::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let default_filter = format!("eduapi={}", verbosity.to_level_filter());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    // Logs go to stderr so response bodies on stdout stay pipeable
    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Ignore error if a subscriber is already set
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Receives exactly one record per dispatched request.
pub trait DiagnosticSink: Send + Sync {
    /// Record the outcome of a request.
    fn record(&self, outcome: &Outcome);
}

/// [`DiagnosticSink`] that emits structured tracing events.
///
/// Successes log at `info`. Failures log at `error` for 5xx and transport
/// errors, `warn` otherwise, and always include the body when there is one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn record(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Success { path, status } => {
                info!(path = %path, status = status.as_u16(), "API response");
            }
            Outcome::Failure(failure) => {
                let status = failure.status.map(|s| s.as_u16());
                let error = failure.transport.as_deref().unwrap_or_default();
                let body = failure
                    .body
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();

                if failure.status.map_or(true, |s| s.is_server_error()) {
                    error!(path = %failure.path, ?status, error = %error, body = %body, "API error");
                } else {
                    warn!(path = %failure.path, ?status, error = %error, body = %body, "API error");
                }
            }
        }
    }
}

/// [`DiagnosticSink`] that keeps every record, for assertions.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    records: Mutex<Vec<Outcome>>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far.
    #[must_use]
    pub fn records(&self) -> Vec<Outcome> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn record(&self, outcome: &Outcome) {
        if let Ok(mut records) = self.records.lock() {
            records.push(outcome.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Failure;
    use reqwest::StatusCode;
    use serde_json::json;

    #[test]
    fn test_verbosity_to_level() {
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::INFO);
        assert_eq!(Verbosity::Verbose.to_level_filter(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.to_level_filter(), Level::TRACE);
    }

    #[test]
    fn test_verbosity_default() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_init_logging_with_all_verbosity_levels() {
        // Only the first call actually installs the subscriber
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Verbose);
        init_logging(Verbosity::Trace);
    }

    #[test]
    fn test_tracing_diagnostics_handles_every_shape() {
        init_test_logging();
        let sink = TracingDiagnostics;

        sink.record(&Outcome::Success {
            path: "notes/".to_string(),
            status: StatusCode::OK,
        });
        sink.record(&Outcome::Failure(Failure {
            path: "notes/".to_string(),
            status: Some(StatusCode::FORBIDDEN),
            body: Some(json!({"detail": "nope"})),
            transport: None,
        }));
        sink.record(&Outcome::Failure(Failure {
            path: "notes/".to_string(),
            transport: Some("connection refused".to_string()),
            ..Failure::default()
        }));
    }

    #[test]
    fn test_recording_diagnostics() {
        let sink = RecordingDiagnostics::new();
        let outcome = Outcome::Success {
            path: "quizzes/".to_string(),
            status: StatusCode::CREATED,
        };
        sink.record(&outcome);

        assert_eq!(sink.records(), vec![outcome]);
    }
}

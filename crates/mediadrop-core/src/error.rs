//! # Design
//!
//! - Keep input validation failures separate from worker invocation failures.
//! - Messages stay constant; offending values and paths live in context fields.
//! - Every worker failure maps onto exactly one [`FailureCategory`].

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::model::FailureCategory;

/// Reasons a submitted source URL is rejected before any work happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SourceUrlError {
    /// No URL was supplied.
    #[error("source url missing")]
    Missing,
    /// The URL exceeded the accepted length.
    #[error("source url too long")]
    TooLong {
        /// Length of the submitted value in bytes.
        len: usize,
    },
    /// The value did not parse as an absolute URL.
    #[error("source url malformed")]
    Malformed,
    /// The URL parsed but does not point at a supported post shape.
    #[error("source url shape unsupported")]
    UnsupportedShape {
        /// Machine-readable reason for the rejection.
        reason: &'static str,
    },
}

impl SourceUrlError {
    /// User-facing guidance for the rejection.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Missing => "Please enter an Instagram URL.",
            Self::TooLong { .. } | Self::Malformed => "Please enter a valid URL.",
            Self::UnsupportedShape { .. } => {
                "Please enter a valid Instagram URL (post, reel, video, or story)."
            }
        }
    }
}

/// Failures raised while preparing, running, or decoding the external worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// A prerequisite was absent before the worker could be spawned.
    #[error("worker precondition missing")]
    PreconditionMissing {
        /// Which prerequisite was missing.
        requirement: &'static str,
        /// Path that was checked, when applicable.
        path: Option<PathBuf>,
    },
    /// The worker process could not be started.
    #[error("worker process spawn failed")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Waiting on the worker process failed.
    #[error("worker process io failed")]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The worker exceeded its time budget and was killed.
    #[error("worker timed out")]
    Timeout {
        /// Budget that was exceeded.
        timeout: Duration,
    },
    /// The worker output contained no decodable result line.
    #[error("worker output could not be decoded")]
    Parse {
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Exit code reported by the process, when it exited normally.
        exit_code: Option<i32>,
    },
}

impl WorkerError {
    /// Category used to shape the client-facing failure.
    #[must_use]
    pub const fn category(&self) -> FailureCategory {
        match self {
            Self::PreconditionMissing { .. } => FailureCategory::PreconditionMissing,
            Self::Spawn { .. } | Self::Io { .. } => FailureCategory::InternalError,
            Self::Timeout { .. } => FailureCategory::WorkerTimeout,
            Self::Parse { .. } => FailureCategory::ParseError,
        }
    }
}

/// Convenience alias for worker results.
pub type WorkerResult<T> = Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_errors_map_to_categories() {
        let cases = [
            (
                WorkerError::PreconditionMissing {
                    requirement: "credentials",
                    path: None,
                },
                FailureCategory::PreconditionMissing,
            ),
            (
                WorkerError::Spawn {
                    program: "python3".to_string(),
                    source: io::Error::from(io::ErrorKind::NotFound),
                },
                FailureCategory::InternalError,
            ),
            (
                WorkerError::Timeout {
                    timeout: Duration::from_secs(1),
                },
                FailureCategory::WorkerTimeout,
            ),
            (
                WorkerError::Parse {
                    reason: "no_result_line",
                    exit_code: Some(1),
                },
                FailureCategory::ParseError,
            ),
        ];
        for (err, category) in cases {
            assert_eq!(err.category(), category);
        }
    }

    #[test]
    fn source_url_messages_never_echo_input() {
        let err = SourceUrlError::TooLong { len: 9_000 };
        assert_eq!(err.user_message(), "Please enter a valid URL.");
        assert_eq!(err.to_string(), "source url too long");
    }
}

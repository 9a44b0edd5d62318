//! # Design
//!
//! - Provide structured, constant-message errors for session storage and delivery.
//! - Capture operation context (paths, fields) without interpolating it into messages.
//! - Keep "not found" undifferentiated so callers cannot probe the filesystem.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors produced by the session store and delivery resolution.
#[derive(Debug, Error)]
pub enum SessionError {
    /// IO failures while interacting with the filesystem.
    #[error("session io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Directory traversal failures.
    #[error("session walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// Zip archive failures.
    #[error("session zip failure")]
    Zip {
        /// Operation that triggered the archive failure.
        operation: &'static str,
        /// Path involved in the archive failure.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },
    /// Every allocation attempt collided with an existing directory.
    #[error("session allocation exhausted")]
    AllocationExhausted {
        /// Number of attempts made.
        attempts: usize,
    },
    /// The requested session or file does not exist.
    #[error("not found")]
    NotFound,
}

impl SessionError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: zip::result::ZipError,
    ) -> Self {
        Self::Zip {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Whether the error means the delivery target does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn io_errors_keep_context_out_of_message() {
        let err = SessionError::io(
            "store.create",
            "/srv/sessions/abc",
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        assert_eq!(err.to_string(), "session io failure");
        assert!(err.source().is_some());
        assert!(!err.is_not_found());
        assert!(SessionError::NotFound.is_not_found());
    }
}

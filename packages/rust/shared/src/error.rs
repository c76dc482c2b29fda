//! Error types for the exam archive toolkit.
//!
//! Library crates use [`ExamArchiveError`] via `thiserror`.
//! App crates (cli/tui) wrap this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all exam archive operations.
#[derive(Debug, thiserror::Error)]
pub enum ExamArchiveError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to the archive API.
    #[error("network error: {0}")]
    Network(String),

    /// The API answered with a non-success status.
    #[error("API error (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    /// Missing, expired, or rejected access token.
    #[error("not authenticated: {0}")]
    Unauthorized(String),

    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body or local data could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (bad form field, out-of-range value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ExamArchiveError>;

impl ExamArchiveError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller should drop its stored session and log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ExamArchiveError::config("missing base URL");
        assert_eq!(err.to_string(), "config error: missing base URL");

        let err = ExamArchiveError::Api {
            status: 400,
            detail: "Email already registered".into(),
        };
        assert_eq!(
            err.to_string(),
            "API error (HTTP 400): Email already registered"
        );

        let err = ExamArchiveError::validation("year must be between 1 and 4");
        assert!(err.to_string().contains("between 1 and 4"));
    }

    #[test]
    fn unauthorized_is_flagged() {
        assert!(ExamArchiveError::Unauthorized("token expired".into()).is_unauthorized());
        assert!(!ExamArchiveError::NotFound("test".into()).is_unauthorized());
    }
}

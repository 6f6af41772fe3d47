//! Error types for linkcurator.
//!
//! Library crates use [`LinkCuratorError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all linkcurator operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkCuratorError {
    /// Rules file loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during a liveness check.
    #[error("network error: {0}")]
    Network(String),

    /// JSON parsing error for a corpus file.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (missing keys, unexpected shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LinkCuratorError>;

impl LinkCuratorError {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LinkCuratorError::config("rules file unreadable");
        assert_eq!(err.to_string(), "config error: rules file unreadable");

        let err = LinkCuratorError::validation("no 'terms' key found");
        assert!(err.to_string().contains("'terms'"));
    }
}

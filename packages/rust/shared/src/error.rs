//! Error types for pathscout.
//!
//! Library crates use [`PathscoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The scan pipeline itself has no fatal error class: transport, parse, and
//! cache failures all degrade to "no data for this step" inside their owning
//! component. These variants cover the boundaries where a hard failure is
//! legitimate (configuration, startup, CLI input).

use std::path::PathBuf;

/// Top-level error type for all pathscout operations.
#[derive(Debug, thiserror::Error)]
pub enum PathscoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while talking to the KEGG REST API.
    #[error("network error: {0}")]
    Network(String),

    /// KGML parsing or relation extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Durable cache layer error.
    #[error("cache error: {0}")]
    Cache(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (malformed gene identifier, bad flag value).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PathscoutError>;

impl PathscoutError {
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
        let err = PathscoutError::config("missing cache directory");
        assert_eq!(err.to_string(), "config error: missing cache directory");

        let err = PathscoutError::validation("gene identifier 'xyz' has no organism prefix");
        assert!(err.to_string().contains("organism prefix"));
    }
}

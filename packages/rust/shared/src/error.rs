//! Error types for wikicorpus.
//!
//! Library crates use [`CorpusError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all wikicorpus operations.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Malformed category file or configuration. Fatal before any network call.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network failure, timeout, rate limit, or server error on one unit of work.
    #[error("transient remote error: {0}")]
    Transient(String),

    /// The article does not exist or resolves to a disambiguation page.
    #[error("not found: {id}")]
    NotFound { id: String },

    /// The remote service answered with a payload we could not interpret.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Unsupported output format or encoding failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CorpusError>;

impl CorpusError {
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

    /// Create a not-found error for the given article identifier.
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only affects a single page or article.
    ///
    /// Recoverable errors are logged and counted by the pipeline; everything
    /// else aborts the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transient(_) | Self::NotFound { .. } | Self::Parse { .. }
        )
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

//! Error types for docflow.
//!
//! Library crates use [`DocflowError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docflow operations.
#[derive(Debug, thiserror::Error)]
pub enum DocflowError {
    /// Invalid construction arguments or configuration file contents.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A branch predicate failed while testing a document.
    #[error("predicate error: {0}")]
    Predicate(String),

    /// A module failed while executing.
    #[error("module {module} failed: {message}")]
    Module { module: String, message: String },

    /// JSON or TOML (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocflowError>;

impl DocflowError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a predicate error from any displayable message.
    pub fn predicate(msg: impl Into<String>) -> Self {
        Self::Predicate(msg.into())
    }

    /// Create a module error tagged with the failing module's name.
    pub fn module(module: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Module {
            module: module.into(),
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

impl From<serde_json::Error> for DocflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

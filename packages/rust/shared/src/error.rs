//! Error types for frontcheck.
//!
//! Library crates use [`FrontcheckError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Only file-level and catalog-level failures are errors. Rule failures on
//! individual records are collected as [`crate::Violation`]s instead.

use std::path::PathBuf;

/// Position of a parse failure inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Byte offset from the start of the file.
    pub offset: usize,
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}, column {}, byte {}",
            self.line, self.column, self.offset
        )
    }
}

/// Top-level error type for all frontcheck operations.
#[derive(Debug, thiserror::Error)]
pub enum FrontcheckError {
    /// Configuration or schema catalog failed to load.
    #[error("config error: {message}")]
    Config { message: String },

    /// A domain file could not be loaded (missing, unparseable, wrong layout).
    #[error(
        "load error in {path:?}: {message}{}",
        .location.map(|l| format!(" ({l})")).unwrap_or_default()
    )]
    Load {
        path: PathBuf,
        message: String,
        location: Option<SourceLocation>,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A background validation task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FrontcheckError>;

impl FrontcheckError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a load error for `path` without a source position.
    pub fn load(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
            location: None,
        }
    }

    /// Create a load error pointing at a position inside `path`.
    pub fn load_at(
        path: impl Into<PathBuf>,
        msg: impl Into<String>,
        location: Option<SourceLocation>,
    ) -> Self {
        Self::Load {
            path: path.into(),
            message: msg.into(),
            location,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error came from configuration or the catalog rather than a data file.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. })
    }
}

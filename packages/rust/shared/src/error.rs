//! Error types for ReportForge.
//!
//! Library crates use [`ReportForgeError`] via `thiserror` for configuration,
//! I/O and input handling. The report core has its own recoverable taxonomy
//! ([`ModuleError`], [`EnrichmentError`]) which is always converted to data
//! before it reaches the caller. The CLI wraps everything with `color-eyre`.

use std::path::PathBuf;

/// Top-level error type for operations outside the report core.
#[derive(Debug, thiserror::Error)]
pub enum ReportForgeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP setup error (client construction, endpoint parsing).
    #[error("network error: {0}")]
    Network(String),

    /// JSON (de)serialization error for inputs or saved reports.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (catalog mismatch, invalid input shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReportForgeError>;

impl ReportForgeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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

impl From<serde_json::Error> for ReportForgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure raised by a content module or by the runner around it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModuleError {
    /// Malformed input or an internal computation error.
    #[error("module generation failed: {reason}")]
    GenerationFailure { reason: String },

    /// The module did not finish within its time budget.
    #[error("module timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl ModuleError {
    /// Create a generation failure from any displayable reason.
    pub fn generation(reason: impl Into<String>) -> Self {
        Self::GenerationFailure {
            reason: reason.into(),
        }
    }
}

/// Failure raised by an enrichment backend. Never surfaced past the runner.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnrichmentError {
    /// Backend absent, unreachable, or returned an unusable response.
    #[error("enrichment unavailable: {0}")]
    Unavailable(String),

    /// Backend exceeded its own per-call budget.
    #[error("enrichment timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

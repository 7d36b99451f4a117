//! Error types for svcdep operations.
//!
//! ## Error Philosophy
//!
//! The library distinguishes operation-level failures from lookup misses:
//!
//! - **`Error`**: failures that stop the current operation (unreadable
//!   snapshot, invalid declarations, I/O).
//! - Lookup misses (a service name with no registry entry) are `Option`s,
//!   not errors. Callers decide whether a miss matters; only a query whose
//!   *every* root is missing fails, with [`Error::NoDependencyInfo`].
//!
//! A corrupt snapshot is fatal to the operation that tried to read it, but
//! the refresh path treats it as "rebuild required" rather than giving up.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for svcdep operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for svcdep operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No snapshot exists at the expected location
    #[error("no dependency snapshot at {}", path.display())]
    SnapshotMissing {
        /// Where the snapshot was expected
        path: PathBuf,
    },

    /// Persisted snapshot exists but cannot be decoded
    #[error("corrupt dependency snapshot at {}", path.display())]
    CorruptSnapshot {
        /// The unreadable snapshot file
        path: PathBuf,
        /// Decoder failure
        #[source]
        source: serde_json::Error,
    },

    /// A service's declared relationships failed validation
    #[error("invalid declaration for service '{service}': {reason}")]
    Build {
        /// Service whose declaration is at fault
        service: String,
        /// What was wrong with it
        reason: String,
    },

    /// Every requested root service is absent from the registry
    #[error("no dependency info for requested services: {}", roots.join(", "))]
    NoDependencyInfo {
        /// The root names that had no entry
        roots: Vec<String>,
    },

    /// Invalid configuration or layout
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a build error for a specific service.
    pub fn build(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Build {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error means the snapshot must be rebuilt
    /// rather than reported (missing or corrupt on load).
    #[must_use]
    pub fn wants_rebuild(&self) -> bool {
        matches!(
            self,
            Self::SnapshotMissing { .. } | Self::CorruptSnapshot { .. }
        )
    }
}

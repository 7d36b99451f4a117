//! Snapshot staleness: a pure comparison between a snapshot's build time
//! and the modification times of everything it was built from.
//!
//! No I/O happens here. Callers gather [`SourceStamp`]s (service
//! declarations, runlevel definitions, configuration) and decide what to
//! do with a stale verdict; the rebuild itself lives in [`crate::refresh`].

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Modification time of one build input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStamp {
    /// Where the input lives, for diagnostics
    pub path: PathBuf,

    /// Its modification time
    pub mtime: DateTime<Utc>,
}

impl SourceStamp {
    /// Create a stamp.
    pub fn new(path: impl Into<PathBuf>, mtime: DateTime<Utc>) -> Self {
        Self {
            path: path.into(),
            mtime,
        }
    }
}

/// Returns `true` if a snapshot built at `built_at` no longer reflects the
/// given sources.
///
/// An absent snapshot (`None`) is always stale. Otherwise the snapshot is
/// stale exactly when some source is strictly newer than the build time; a
/// source modified at the build instant is still covered.
#[must_use]
pub fn is_stale(built_at: Option<DateTime<Utc>>, stamps: &[SourceStamp]) -> bool {
    match built_at {
        None => true,
        Some(built_at) => stamps.iter().any(|stamp| stamp.mtime > built_at),
    }
}

/// The most recently modified source, if any.
///
/// Useful for telling a user which input made the snapshot stale.
#[must_use]
pub fn newest(stamps: &[SourceStamp]) -> Option<&SourceStamp> {
    stamps.iter().max_by_key(|stamp| stamp.mtime)
}

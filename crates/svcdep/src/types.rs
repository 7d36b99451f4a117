//! Core data types: service identity, declared relationships, and the
//! source records the builder consumes.

use crate::relation::DepKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// Unique, case-sensitive name of a service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceName(String);

impl ServiceName {
    /// Create a new service name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty name (rejected by the builder).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// Lets name-keyed maps answer &str lookups without an allocation.
impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One declared relationship: a tag and the service it points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DepEntry {
    /// The relationship tag
    pub kind: DepKind,

    /// Name of the target service (may be dangling)
    pub target: ServiceName,
}

impl DepEntry {
    /// Create a new relationship entry.
    pub fn new(kind: DepKind, target: impl Into<ServiceName>) -> Self {
        Self {
            kind,
            target: target.into(),
        }
    }
}

/// A service frozen inside a snapshot.
///
/// Immutable once loaded; a rebuild produces a whole new snapshot rather
/// than patching services in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    /// Unique name
    pub name: ServiceName,

    /// Declared relationships, declaration order, deduplicated
    pub entries: Vec<DepEntry>,

    /// Runlevels this service is a member of
    pub runlevels: BTreeSet<String>,

    /// Modification time of the declaration source
    pub mtime: DateTime<Utc>,
}

impl Service {
    /// Targets of the given tag, in declaration order.
    pub fn targets(&self, kind: DepKind) -> impl Iterator<Item = &ServiceName> {
        self.entries
            .iter()
            .filter(move |entry| entry.kind == kind)
            .map(|entry| &entry.target)
    }

    /// Returns `true` if this service belongs to the named runlevel.
    #[must_use]
    pub fn in_runlevel(&self, runlevel: &str) -> bool {
        self.runlevels.contains(runlevel)
    }
}

/// A raw (tag, target) pair as extracted from a declaration, before tag
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Relationship tag as written
    pub tag: String,

    /// Target service name as written
    pub target: String,
}

impl RawEntry {
    /// Create a raw entry.
    pub fn new(tag: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            target: target.into(),
        }
    }
}

/// Builder input for one service: its extracted entries and source stamp.
#[derive(Debug, Clone)]
pub struct ServiceSource {
    /// Service name
    pub name: ServiceName,

    /// Modification time of the declaration
    pub mtime: DateTime<Utc>,

    /// Extracted (tag, target) pairs, declaration order
    pub entries: Vec<RawEntry>,
}

/// Builder input for one runlevel: its member names and source stamp.
#[derive(Debug, Clone)]
pub struct RunlevelSource {
    /// Runlevel name
    pub name: String,

    /// Modification time of the membership definition
    pub mtime: DateTime<Utc>,

    /// Member service names
    pub members: Vec<ServiceName>,
}

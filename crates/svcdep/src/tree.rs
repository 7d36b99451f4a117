//! The dependency tree snapshot and the builder that produces it.
//!
//! A [`DepTree`] is the whole service registry frozen at build time. It is
//! the unit of persistence and replacement: rebuilds construct a fresh tree
//! and atomically swap the stored copy, never patch one in place.

use crate::error::{Error, Result};
use crate::relation::DepKind;
use crate::types::{DepEntry, RunlevelSource, Service, ServiceName, ServiceSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

/// Serializable snapshot of every known service and runlevel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepTree {
    /// When this snapshot was built
    pub built_at: DateTime<Utc>,

    /// All services, in source discovery order
    pub services: Vec<Service>,

    /// Runlevel name to member service names.
    ///
    /// Authoritative for runlevel membership: a member name listed here
    /// counts even when no service declaration exists for it.
    pub runlevels: BTreeMap<String, BTreeSet<ServiceName>>,
}

impl DepTree {
    /// Build a snapshot from extracted service and runlevel sources.
    ///
    /// Validates names and relationship tags, deduplicates entries while
    /// keeping declaration order, and stamps the result with the current
    /// time. Services named in `masked` are left out entirely, including
    /// their runlevel memberships; anything still pointing at them becomes
    /// a dangling target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] naming the offending service for an empty
    /// or duplicate service name, an empty target, or an unknown
    /// relationship tag.
    pub fn build(
        sources: Vec<ServiceSource>,
        runlevels: Vec<RunlevelSource>,
        masked: &[ServiceName],
    ) -> Result<Self> {
        let masked: HashSet<&ServiceName> = masked.iter().collect();
        let mut services = Vec::with_capacity(sources.len());
        let mut names: HashSet<ServiceName> = HashSet::with_capacity(sources.len());

        for source in sources {
            if source.name.is_empty() {
                return Err(Error::build(source.name.as_str(), "service name is empty"));
            }
            if masked.contains(&source.name) {
                debug!(service = %source.name, "skipping masked service");
                continue;
            }
            if !names.insert(source.name.clone()) {
                return Err(Error::build(source.name.as_str(), "duplicate service declaration"));
            }

            let mut entries = Vec::with_capacity(source.entries.len());
            let mut seen: HashSet<DepEntry> = HashSet::new();
            for raw in source.entries {
                let kind: DepKind = raw
                    .tag
                    .parse()
                    .map_err(|e: crate::relation::UnknownTag| {
                        Error::build(source.name.as_str(), e.to_string())
                    })?;
                if raw.target.is_empty() {
                    return Err(Error::build(
                        source.name.as_str(),
                        format!("empty target for tag '{kind}'"),
                    ));
                }
                let entry = DepEntry::new(kind, raw.target);
                if seen.insert(entry.clone()) {
                    entries.push(entry);
                }
            }

            services.push(Service {
                name: source.name,
                entries,
                runlevels: BTreeSet::new(),
                mtime: source.mtime,
            });
        }

        let mut membership: BTreeMap<String, BTreeSet<ServiceName>> = BTreeMap::new();
        for runlevel in runlevels {
            let members = membership.entry(runlevel.name.clone()).or_default();
            for member in runlevel.members {
                if masked.contains(&member) {
                    continue;
                }
                members.insert(member);
            }
        }
        for service in &mut services {
            for (level, members) in &membership {
                if members.contains(&service.name) {
                    service.runlevels.insert(level.clone());
                }
            }
        }

        debug!(
            services = services.len(),
            runlevels = membership.len(),
            "built dependency tree"
        );

        Ok(Self {
            built_at: Utc::now(),
            services,
            runlevels: membership,
        })
    }

    /// Compares relationship content, ignoring timestamps.
    ///
    /// Two builds from unchanged sources are equivalent by this measure
    /// even though their `built_at` values differ.
    #[must_use]
    pub fn same_relations(&self, other: &Self) -> bool {
        if self.runlevels != other.runlevels || self.services.len() != other.services.len() {
            return false;
        }
        self.services.iter().zip(&other.services).all(|(a, b)| {
            a.name == b.name && a.entries == b.entries && a.runlevels == b.runlevels
        })
    }

    /// Number of services in the snapshot.
    #[must_use]
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Number of runlevels in the snapshot.
    #[must_use]
    pub fn runlevel_count(&self) -> usize {
        self.runlevels.len()
    }
}

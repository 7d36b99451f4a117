//! Cache refresh orchestration: load the snapshot if it is still good,
//! rebuild and persist it otherwise.
//!
//! Rebuild lifecycle events go through `tracing`; the library never prints.
//! A corrupt snapshot is logged and rebuilt over. Build and persistence
//! failures propagate; a stale tree is never served once staleness has
//! been established.

use crate::config::{Conf, Layout};
use crate::error::{Error, Result};
use crate::registry::Registry;
use crate::sources;
use crate::staleness;
use crate::store;
use crate::tree::DepTree;
use tracing::{debug, error, info, warn};

/// Result of [`ensure_fresh`]: the query-ready registry and whether the
/// snapshot had to be rebuilt to get it.
#[derive(Debug)]
pub struct Refresh {
    /// Registry over the current snapshot
    pub registry: Registry,

    /// `true` if this call rebuilt and persisted a new snapshot
    pub rebuilt: bool,
}

/// Load the persisted snapshot, rebuilding it first when `force` is set,
/// the snapshot is missing or corrupt, or any source is newer.
///
/// # Errors
///
/// Returns [`Error::Build`] when a declaration fails validation, and
/// [`Error::Config`]/[`Error::Io`] for layout and filesystem failures.
/// A corrupt snapshot is not an error here; it triggers the rebuild path.
pub fn ensure_fresh(layout: &Layout, conf: &Conf, force: bool) -> Result<Refresh> {
    let snapshot_path = layout.snapshot_file();
    let stamps = sources::source_stamps(layout)?;

    if !force {
        match store::load(&snapshot_path) {
            Ok(tree) => {
                if staleness::is_stale(Some(tree.built_at), &stamps) {
                    if let Some(newest) = staleness::newest(&stamps) {
                        info!(
                            source = %newest.path.display(),
                            built_at = %tree.built_at,
                            "snapshot is stale"
                        );
                    }
                } else {
                    debug!(built_at = %tree.built_at, "snapshot is fresh");
                    return Ok(Refresh {
                        registry: Registry::new(tree),
                        rebuilt: false,
                    });
                }
            }
            Err(e @ Error::SnapshotMissing { .. }) => {
                debug!(error = %e, "no snapshot yet");
            }
            Err(e @ Error::CorruptSnapshot { .. }) => {
                warn!(error = %e, "snapshot unreadable, rebuilding");
            }
            Err(e) => return Err(e),
        }
    }

    info!("rebuilding dependency tree");
    let tree = match rebuild(layout, conf) {
        Ok(tree) => tree,
        Err(e) => {
            error!(error = %e, "dependency tree rebuild failed");
            return Err(e);
        }
    };
    if let Err(e) = store::save(&tree, &snapshot_path) {
        error!(error = %e, "failed to persist dependency tree");
        return Err(e);
    }
    info!(
        services = tree.service_count(),
        runlevels = tree.runlevel_count(),
        "dependency tree rebuilt"
    );

    Ok(Refresh {
        registry: Registry::new(tree),
        rebuilt: true,
    })
}

fn rebuild(layout: &Layout, conf: &Conf) -> Result<DepTree> {
    let services = sources::scan_services(layout)?;
    let runlevels = sources::scan_runlevels(layout)?;
    DepTree::build(services, runlevels, &conf.masked)
}

//! `svcdep check` command implementation.

use std::process::ExitCode;

use colored::Colorize;
use svcdep::{sources, staleness, store, Error, Layout};
use tracing::info;

/// Run the check command.
///
/// Reports `fresh` or `stale` without rebuilding anything. Exits 0 when
/// the snapshot is current, 1 when a source outdates it, and 2 when there
/// is no usable snapshot at all.
pub fn run(layout: &Layout) -> Result<ExitCode, Error> {
    let stamps = sources::source_stamps(layout)?;

    let tree = match store::load(&layout.snapshot_file()) {
        Ok(tree) => tree,
        Err(e) if e.wants_rebuild() => {
            info!(error = %e, "snapshot unusable");
            println!("{} (no usable snapshot)", "stale".yellow().bold());
            return Ok(ExitCode::from(2));
        }
        Err(e) => return Err(e),
    };

    if staleness::is_stale(Some(tree.built_at), &stamps) {
        if let Some(newest) = staleness::newest(&stamps) {
            info!(
                source = %newest.path.display(),
                mtime = %newest.mtime,
                built_at = %tree.built_at,
                "newest source outdates the snapshot"
            );
        }
        println!("{}", "stale".yellow().bold());
        Ok(ExitCode::from(1))
    } else {
        println!("{}", "fresh".green().bold());
        Ok(ExitCode::SUCCESS)
    }
}

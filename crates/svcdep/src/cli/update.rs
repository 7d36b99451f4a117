//! `svcdep update` command implementation.

use std::process::ExitCode;

use colored::Colorize;
use svcdep::{Conf, Error, Layout};

/// Run the update command.
pub fn run(layout: &Layout) -> Result<ExitCode, Error> {
    println!(
        "{} {}...",
        "Rebuilding".cyan().bold(),
        layout.root().display()
    );

    let conf = Conf::load(&layout.config_file())?;
    let refresh = svcdep::ensure_fresh(layout, &conf, true)?;
    let tree = refresh.registry.tree();

    println!(
        "{} {} services across {} runlevels",
        "Cached".green().bold(),
        tree.service_count(),
        tree.runlevel_count()
    );
    println!(
        "{}: {}",
        "Snapshot".dimmed(),
        layout.snapshot_file().display()
    );

    Ok(ExitCode::SUCCESS)
}

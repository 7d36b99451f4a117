//! `svcdep show` command implementation.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use colored::Colorize;
use svcdep::{Conf, Error, Layout, Relation, ServiceName};

/// Run the show command.
pub fn run(layout: &Layout, service: &str) -> Result<ExitCode, Error> {
    let conf = Conf::load(&layout.config_file())?;
    let refresh = svcdep::ensure_fresh(layout, &conf, false)?;
    let registry = &refresh.registry;

    let Some(svc) = registry.get(service) else {
        eprintln!(
            "{}: no dependency info for service '{service}'",
            "error".red().bold()
        );
        return Ok(ExitCode::FAILURE);
    };

    println!("{}", svc.name.as_str().cyan().bold());
    println!("  {} {}", "Modified:".dimmed(), modified_stamp(svc.mtime));
    println!();

    println!("  {}:", "Declares".white().bold());
    if svc.entries.is_empty() {
        println!("    (none)");
    } else {
        for entry in &svc.entries {
            println!("    {} {}", entry.kind.as_str().green(), entry.target);
        }
    }

    println!();
    print_names(
        "Runlevels",
        &svc.runlevels.iter().map(String::as_str).collect::<Vec<_>>(),
    );
    print_names("Needed by", &as_strs(registry.related(service, Relation::NeededBy)));
    print_names("Used by", &as_strs(registry.related(service, Relation::UsedBy)));

    let missing = registry.missing_required(service);
    if !missing.is_empty() {
        println!();
        println!(
            "  {} ({}):",
            "Missing required".red().bold(),
            missing.len()
        );
        for name in missing {
            println!("    {} {name}", "•".red());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn as_strs(names: Vec<&ServiceName>) -> Vec<&str> {
    names.into_iter().map(ServiceName::as_str).collect()
}

/// Declaration mtime as carried in the snapshot, minute precision.
fn modified_stamp(mtime: DateTime<Utc>) -> String {
    mtime.format("%Y-%m-%d %H:%M").to_string()
}

/// Print one labelled name list, `(none)` when empty.
fn print_names(label: &str, names: &[&str]) {
    if names.is_empty() {
        println!("  {}: (none)", label.white().bold());
    } else {
        println!("  {}: {}", label.white().bold(), names.join(" "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn modified_stamp_is_minute_precise_utc() {
        let mtime = Utc.with_ymd_and_hms(2026, 8, 21, 9, 14, 3).unwrap();
        assert_eq!(modified_stamp(mtime), "2026-08-21 09:14");
    }
}

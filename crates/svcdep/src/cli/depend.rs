//! `svcdep depend` command implementation.

use std::process::ExitCode;

use colored::Colorize;
use svcdep::config::RUNLEVEL_ENV;
use svcdep::{depends, Conf, Error, Layout, QueryOpts, Relation, ServiceName};

/// Run the depend command.
///
/// Refreshes the cache (forced with `update`), resolves the closure of
/// `services` under the requested relations, and prints it space-separated
/// on one line. Services without dependency info are diagnosed on stderr
/// individually; the rest still resolve, but the exit code is non-zero.
#[allow(clippy::fn_params_excessive_bools)]
pub fn run(
    layout: &Layout,
    services: &[String],
    types: &[Relation],
    no_trace: bool,
    strict: bool,
    update: bool,
    runlevel: Option<String>,
) -> Result<ExitCode, Error> {
    let conf = Conf::load(&layout.config_file())?;
    let refresh = svcdep::ensure_fresh(layout, &conf, update)?;

    // Update-only invocation: the rebuild was the whole job.
    if services.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    let runlevel = runlevel
        .or_else(|| std::env::var(RUNLEVEL_ENV).ok())
        .or_else(|| conf.default_runlevel.clone());

    let roots: Vec<ServiceName> = services
        .iter()
        .map(|name| ServiceName::new(name.as_str()))
        .collect();

    let mut unknown = 0;
    for root in &roots {
        if !refresh.registry.contains(root.as_str()) {
            eprintln!(
                "{}: no dependency info for service '{root}'",
                "error".red().bold()
            );
            unknown += 1;
        }
    }

    let opts = QueryOpts {
        trace: !no_trace,
        strict,
    };
    let resolved = match depends(&refresh.registry, types, &roots, runlevel.as_deref(), opts) {
        Ok(resolved) => resolved,
        // Every root was already diagnosed above; there is nothing to print.
        Err(Error::NoDependencyInfo { .. }) => Vec::new(),
        Err(e) => return Err(e),
    };

    if !resolved.is_empty() {
        let line: Vec<&str> = resolved.iter().map(ServiceName::as_str).collect();
        println!("{}", line.join(" "));
    }

    if unknown == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

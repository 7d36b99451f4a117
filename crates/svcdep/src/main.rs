//! Svcdep CLI - Service dependency resolution from the command line.
//!
//! Svcdep caches service relationship declarations as a dependency tree
//! snapshot and answers closure queries over it: what must come up with
//! `sshd`, what breaks if `net` goes away, whether the cache still
//! matches the files on disk.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use svcdep::config::{DEFAULT_ROOT, ROOT_ENV};
use svcdep::{Layout, Relation};
use tracing_subscriber::EnvFilter;

mod cli;

/// Svcdep: Service dependency tree cache and query interface.
#[derive(Parser, Debug)]
#[command(name = "svcdep")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Layout root directory (defaults to $SVCDEP_ROOT, then /etc/svcdep)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the services related to the named ones
    Depend {
        /// Services to resolve from
        #[arg(required_unless_present = "update")]
        services: Vec<String>,

        /// Relation types to follow (repeatable or comma-separated;
        /// defaults to need,use)
        #[arg(
            short = 't',
            long = "type",
            value_name = "TYPE",
            value_delimiter = ',',
            value_parser = parse_relation
        )]
        types: Vec<Relation>,

        /// Direct relationships only, no transitive expansion
        #[arg(short = 'T', long)]
        no_trace: bool,

        /// Keep only members of the runlevel
        #[arg(short, long)]
        strict: bool,

        /// Rebuild the cache before resolving
        #[arg(short, long)]
        update: bool,

        /// Runlevel context (defaults to $SVCDEP_RUNLEVEL, then the
        /// configured default)
        #[arg(short, long, value_name = "NAME")]
        runlevel: Option<String>,
    },

    /// Rebuild the dependency tree cache from scratch
    Update,

    /// Report whether the cached tree is still current
    Check,

    /// Show one service's declarations, runlevels, and dependents
    Show {
        /// Service name
        service: String,
    },
}

/// Parse a `--type` value, naming the full vocabulary on failure.
fn parse_relation(s: &str) -> Result<Relation, String> {
    s.parse().map_err(|_| {
        let known = Relation::ALL.map(Relation::as_str).join(", ");
        format!("unknown relation type '{s}' (expected one of: {known})")
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    // Determine the layout root
    let root = cli
        .root
        .or_else(|| std::env::var_os(ROOT_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ROOT));
    let layout = Layout::new(root);

    // Run the appropriate command
    let result = match cli.command {
        Commands::Depend {
            services,
            types,
            no_trace,
            strict,
            update,
            runlevel,
        } => cli::depend::run(&layout, &services, &types, no_trace, strict, update, runlevel),
        Commands::Update => cli::update::run(&layout),
        Commands::Check => cli::check::run(&layout),
        Commands::Show { service } => cli::show::run(&layout, &service),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            // Show cause chain for nested errors
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  {}: {cause}", "caused by".dimmed());
                source = std::error::Error::source(cause);
            }
            ExitCode::FAILURE
        }
    }
}

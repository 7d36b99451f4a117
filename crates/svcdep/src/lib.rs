//! # svcdep: Service Dependency Cache and Query Engine
//!
//! svcdep resolves ordering dependencies between system services managed
//! by an init-style framework. Services declare typed relationships to
//! other services (`need`, `use`, `after`, `before`, `provide`); svcdep
//! builds a persisted snapshot of the whole graph and answers "which
//! services relate to these, through these relationship types, in this
//! runlevel" with transitive closure, cycle safety, and strict/non-strict
//! visibility.
//!
//! ## Design Philosophy
//!
//! - **Snapshot, not live graph** - queries run against a cached tree;
//!   staleness against the declaration sources decides when to rebuild
//! - **Pure query core** - traversal is a function over a loaded snapshot;
//!   all I/O stays at the edges (scanning, persistence)
//! - **Whole replacement** - a rebuild atomically replaces the snapshot;
//!   nothing mutates in place
//! - **Orthogonal options** - transitive tracing and runlevel strictness
//!   are independent toggles
//! - **Embeddable** - library first, CLI second
//!
//! ## Quick Start
//!
//! ```no_run
//! use svcdep::{depends, ensure_fresh, Conf, Layout, QueryOpts, Relation, ServiceName};
//!
//! let layout = Layout::new("/etc/svcdep");
//! let conf = Conf::load(&layout.config_file())?;
//!
//! // Load the snapshot, rebuilding it if any source changed.
//! let refresh = ensure_fresh(&layout, &conf, false)?;
//!
//! // Everything sshd needs, directly or transitively.
//! let roots = vec![ServiceName::from("sshd")];
//! let related = depends(
//!     &refresh.registry,
//!     &[Relation::Need],
//!     &roots,
//!     Some("default"),
//!     QueryOpts::default(),
//! )?;
//! for name in &related {
//!     println!("{name}");
//! }
//! # Ok::<(), svcdep::Error>(())
//! ```

pub mod config;
pub mod error;
pub mod query;
pub mod refresh;
pub mod registry;
pub mod relation;
pub mod sources;
pub mod staleness;
pub mod store;
pub mod tree;
pub mod types;

pub use config::{Conf, Layout};
pub use error::{Error, Result};
pub use query::{depends, QueryOpts};
pub use refresh::{ensure_fresh, Refresh};
pub use registry::Registry;
pub use relation::{DepKind, Direction, Relation, Strength, UnknownTag};
pub use staleness::{is_stale, SourceStamp};
pub use tree::DepTree;
pub use types::{DepEntry, RawEntry, RunlevelSource, Service, ServiceName, ServiceSource};

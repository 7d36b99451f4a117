//! Directory layout conventions and the optional configuration file.
//!
//! Everything svcdep reads or writes lives under one root directory:
//!
//! ```text
//! <root>/
//!   init.d/            service declaration files
//!   runlevels/<name>/  runlevel membership (entry names are the members)
//!   config.yaml        optional configuration
//!   cache/deptree.json the persisted snapshot
//! ```
//!
//! The root defaults to `/etc/svcdep` and can be overridden per invocation.

use crate::error::{Error, Result};
use crate::types::ServiceName;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the service declaration directory.
pub const SVC_DIR_NAME: &str = "init.d";

/// Name of the runlevel directory.
pub const RUNLEVEL_DIR_NAME: &str = "runlevels";

/// Name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Directory the snapshot is cached under.
pub const CACHE_DIR_NAME: &str = "cache";

/// File name of the persisted snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "deptree.json";

/// Default root directory.
pub const DEFAULT_ROOT: &str = "/etc/svcdep";

/// Environment variable overriding the root directory.
pub const ROOT_ENV: &str = "SVCDEP_ROOT";

/// Environment variable supplying the runlevel context.
pub const RUNLEVEL_ENV: &str = "SVCDEP_RUNLEVEL";

/// Filesystem locations under one svcdep root.
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding service declaration files.
    #[must_use]
    pub fn service_dir(&self) -> PathBuf {
        self.root.join(SVC_DIR_NAME)
    }

    /// Directory holding one subdirectory per runlevel.
    #[must_use]
    pub fn runlevel_dir(&self) -> PathBuf {
        self.root.join(RUNLEVEL_DIR_NAME)
    }

    /// Path of the optional configuration file.
    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Path the snapshot is persisted at.
    #[must_use]
    pub fn snapshot_file(&self) -> PathBuf {
        self.root.join(CACHE_DIR_NAME).join(SNAPSHOT_FILE_NAME)
    }
}

/// Contents of `config.yaml`.
///
/// The file is optional; every field has a default. Because `masked`
/// changes what a build extracts, the file's mtime participates in
/// staleness checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Conf {
    /// Runlevel assumed when neither the command line nor the environment
    /// name one
    pub default_runlevel: Option<String>,

    /// Services excluded from the tree at build time
    pub masked: Vec<ServiceName>,
}

impl Conf {
    /// Load configuration from `path`.
    ///
    /// A missing file yields the defaults; that is the common case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file exists but is not valid YAML
    /// for this schema, and [`Error::Io`] for other read failures.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        serde_yaml::from_str(&text)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }
}

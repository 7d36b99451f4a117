//! Snapshot persistence with the temp-file-then-rename pattern.
//!
//! On POSIX systems a rename within one filesystem is atomic, so a reader
//! opening the snapshot path sees either the previous complete snapshot or
//! the new complete snapshot, never a partial write. Each writer stages
//! through its own temp file, so two concurrent writers race harmlessly:
//! last rename wins, both results are complete trees built from the same
//! sources.
//!
//! The snapshot is one JSON document. A file that exists but does not
//! decode is reported as [`Error::CorruptSnapshot`]; the refresh path
//! treats that as "rebuild", everything else treats it as fatal.

use crate::error::{Error, Result};
use crate::tree::DepTree;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Atomically write a snapshot to `path`.
///
/// Parent directories are created as needed. Data lands in a
/// writer-unique sibling `.tmp` file first and is renamed over the target
/// once fully flushed; on failure the temp file is removed best-effort
/// and the previous snapshot (if any) is untouched.
///
/// # Errors
///
/// Returns [`Error::Io`] if the temp file cannot be written or the rename
/// fails.
pub fn save(tree: &DepTree, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = make_temp_path(path);
    if let Err(e) = write_to_temp(&temp_path, tree) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    fs::rename(&temp_path, path)?;

    debug!(path = %path.display(), services = tree.service_count(), "snapshot written");
    Ok(())
}

/// Load a snapshot from `path`.
///
/// # Errors
///
/// Returns [`Error::SnapshotMissing`] if the file does not exist,
/// [`Error::CorruptSnapshot`] if it exists but cannot be decoded, and
/// [`Error::Io`] for other read failures.
pub fn load(path: &Path) -> Result<DepTree> {
    let data = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::SnapshotMissing {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io(e)
        }
    })?;

    serde_json::from_slice(&data).map_err(|source| Error::CorruptSnapshot {
        path: path.to_path_buf(),
        source,
    })
}

/// Distinguishes temp files of concurrent writers within one process;
/// the pid in the name does the same across processes.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Temp path used during an atomic write: the target's name plus the
/// writer's pid, a sequence number, and `.tmp`. Unique per writer, so
/// concurrent saves never stage through the same inode and one writer's
/// rename or cleanup cannot touch another's half-written file.
fn make_temp_path(path: &Path) -> PathBuf {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let pid = std::process::id();
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(format!(".{pid}.{seq}.tmp"));
            new_ext
        }
        None => std::ffi::OsString::from(format!("{pid}.{seq}.tmp")),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

fn write_to_temp(temp_path: &Path, tree: &DepTree) -> Result<()> {
    let data = serde_json::to_vec(tree).map_err(std::io::Error::other)?;
    let file = File::create(temp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&data)?;
    writer.flush()?;
    Ok(())
}

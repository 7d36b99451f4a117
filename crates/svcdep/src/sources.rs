//! Filesystem scanning: turning the layout's directories into builder
//! input and staleness stamps.
//!
//! Service declarations are plain line-oriented files under `init.d/`: the
//! first whitespace-separated token of a line is the relationship tag, the
//! remaining tokens are targets, `#` starts a comment. Runlevels are
//! subdirectories of `runlevels/` whose entry names are the member
//! services; entries are typically symlinks and only their names matter.
//!
//! Scanning is best-effort per entry: an unreadable file or a name that is
//! not valid UTF-8 is logged and skipped rather than failing the whole
//! scan. A missing `init.d/` directory, on the other hand, means the
//! layout root is wrong and fails loudly.

use crate::config::Layout;
use crate::error::{Error, Result};
use crate::staleness::SourceStamp;
use crate::types::{RawEntry, RunlevelSource, ServiceName, ServiceSource};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Read every service declaration under the layout's `init.d/`.
///
/// Results are sorted by service name so rebuilds from unchanged sources
/// see identical input order.
///
/// # Errors
///
/// Returns [`Error::Config`] if the service directory does not exist and
/// [`Error::Io`] for other directory-level failures.
pub fn scan_services(layout: &Layout) -> Result<Vec<ServiceSource>> {
    let dir = layout.service_dir();
    let mut sources = Vec::new();

    for path in dir_entries(&dir, true)? {
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cannot stat service file, skipping");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = utf8_file_name(&path) else {
            continue;
        };
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "cannot read service file, skipping");
                continue;
            }
        };

        sources.push(ServiceSource {
            name: ServiceName::from(name),
            mtime: to_utc(metadata.modified()?),
            entries: parse_entries(&text),
        });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(services = sources.len(), dir = %dir.display(), "scanned service declarations");
    Ok(sources)
}

/// Read runlevel memberships under the layout's `runlevels/`.
///
/// A missing runlevel directory is an empty membership world, not an
/// error; strict queries simply find no members.
///
/// # Errors
///
/// Returns [`Error::Io`] for directory-level read failures.
pub fn scan_runlevels(layout: &Layout) -> Result<Vec<RunlevelSource>> {
    let dir = layout.runlevel_dir();
    let mut runlevels = Vec::new();

    let paths = match dir_entries(&dir, false) {
        Ok(paths) => paths,
        Err(Error::Config(_)) => {
            debug!(dir = %dir.display(), "no runlevel directory");
            return Ok(runlevels);
        }
        Err(e) => return Err(e),
    };

    for path in paths {
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                warn!(runlevel = %path.display(), error = %e, "cannot stat runlevel, skipping");
                continue;
            }
        };
        if !metadata.is_dir() {
            continue;
        }
        let Some(name) = utf8_file_name(&path) else {
            continue;
        };

        let mut mtime = to_utc(metadata.modified()?);
        let mut members = Vec::new();
        for member in dir_entries(&path, false)? {
            let Some(member_name) = utf8_file_name(&member) else {
                continue;
            };
            if let Ok(link) = fs::symlink_metadata(&member) {
                if let Ok(modified) = link.modified() {
                    mtime = mtime.max(to_utc(modified));
                }
            }
            members.push(ServiceName::from(member_name));
        }
        members.sort();

        runlevels.push(RunlevelSource {
            name: name.to_string(),
            mtime,
            members,
        });
    }

    runlevels.sort_by(|a, b| a.name.cmp(&b.name));
    debug!(runlevels = runlevels.len(), dir = %dir.display(), "scanned runlevels");
    Ok(runlevels)
}

/// Gather the modification stamps of every build input.
///
/// Covers the service directory itself (file additions and removals bump
/// it), every service file, every runlevel directory and its entries, and
/// the configuration file when present.
///
/// # Errors
///
/// Returns [`Error::Config`] if the service directory does not exist and
/// [`Error::Io`] for other failures.
pub fn source_stamps(layout: &Layout) -> Result<Vec<SourceStamp>> {
    let mut stamps = Vec::new();

    let svc_dir = layout.service_dir();
    stamps.push(SourceStamp::new(&svc_dir, modified(&svc_dir)?));
    for path in dir_entries(&svc_dir, true)? {
        match modified(&path) {
            Ok(mtime) => stamps.push(SourceStamp::new(path, mtime)),
            Err(e) => warn!(file = %path.display(), error = %e, "cannot stamp source, skipping"),
        }
    }

    let runlevel_dir = layout.runlevel_dir();
    if runlevel_dir.is_dir() {
        stamps.push(SourceStamp::new(&runlevel_dir, modified(&runlevel_dir)?));
        for level in dir_entries(&runlevel_dir, false)? {
            match modified(&level) {
                Ok(mtime) => stamps.push(SourceStamp::new(&level, mtime)),
                Err(e) => {
                    warn!(runlevel = %level.display(), error = %e, "cannot stamp runlevel, skipping");
                    continue;
                }
            }
            if level.is_dir() {
                for member in dir_entries(&level, false)? {
                    if let Ok(link) = fs::symlink_metadata(&member) {
                        if let Ok(mtime) = link.modified() {
                            stamps.push(SourceStamp::new(member, to_utc(mtime)));
                        }
                    }
                }
            }
        }
    }

    let config = layout.config_file();
    if let Ok(mtime) = modified(&config) {
        stamps.push(SourceStamp::new(config, mtime));
    }

    Ok(stamps)
}

/// Non-hidden entries of `dir`, in arbitrary order.
///
/// `required` controls whether a missing directory is a configuration
/// error or just rides through as such for the caller to interpret.
fn dir_entries(dir: &Path, required: bool) -> Result<Vec<std::path::PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let what = if required { "service directory" } else { "directory" };
            Error::config(format!("{what} not found: {}", dir.display()))
        } else {
            Error::Io(e)
        }
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "failed to read directory entry, skipping");
                continue;
            }
        };
        let path = entry.path();
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.starts_with('.') {
                continue;
            }
        }
        paths.push(path);
    }
    Ok(paths)
}

/// File name as UTF-8, warning and yielding `None` otherwise.
fn utf8_file_name(path: &Path) -> Option<&str> {
    let name = path.file_name().and_then(|n| n.to_str());
    if name.is_none() {
        warn!(path = %path.display(), "name is not valid UTF-8, skipping");
    }
    name
}

fn modified(path: &Path) -> Result<DateTime<Utc>> {
    Ok(to_utc(fs::metadata(path)?.modified()?))
}

fn to_utc(time: std::time::SystemTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(time)
}

/// Parse a declaration file into raw entries.
///
/// One line per tag: `need net localmount` declares two entries. A tag
/// with no targets declares nothing. Text after `#` is comment.
fn parse_entries(text: &str) -> Vec<RawEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = match line.split_once('#') {
            Some((data, _comment)) => data,
            None => line,
        };
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        for target in tokens {
            entries.push(RawEntry::new(tag, target));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_with_services(files: &[(&str, &str)]) -> (TempDir, Layout) {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());
        fs::create_dir_all(layout.service_dir()).unwrap();
        for (name, content) in files {
            fs::write(layout.service_dir().join(name), content).unwrap();
        }
        (dir, layout)
    }

    fn add_runlevel(layout: &Layout, name: &str, members: &[&str]) {
        let dir = layout.runlevel_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        for member in members {
            fs::write(dir.join(member), "").unwrap();
        }
    }

    #[test]
    fn parse_entries_splits_tags_and_targets() {
        let entries = parse_entries("need net localmount\nuse dns\n");
        assert_eq!(
            entries,
            [
                RawEntry::new("need", "net"),
                RawEntry::new("need", "localmount"),
                RawEntry::new("use", "dns"),
            ]
        );
    }

    #[test]
    fn parse_entries_ignores_comments_and_blanks() {
        let entries = parse_entries("# header\n\nneed net # inline\n   \nuse\n");
        assert_eq!(entries, [RawEntry::new("need", "net")]);
    }

    #[test]
    fn scan_returns_services_sorted_by_name() {
        let (_dir, layout) = layout_with_services(&[
            ("sshd", "need net\nuse dns\n"),
            ("apache", "need net\n"),
            ("net", ""),
        ]);

        let sources = scan_services(&layout).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["apache", "net", "sshd"]);
        assert_eq!(
            sources[2].entries,
            [RawEntry::new("need", "net"), RawEntry::new("use", "dns")]
        );
    }

    #[test]
    fn scan_skips_hidden_files_and_subdirectories() {
        let (_dir, layout) = layout_with_services(&[("sshd", "")]);
        fs::write(layout.service_dir().join(".sshd.swp"), "junk").unwrap();
        fs::create_dir(layout.service_dir().join("conf.d")).unwrap();

        let sources = scan_services(&layout).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["sshd"]);
    }

    #[test]
    fn missing_service_dir_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let layout = Layout::new(dir.path());

        let err = scan_services(&layout).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn runlevels_list_sorted_members() {
        let (_dir, layout) = layout_with_services(&[("sshd", ""), ("net", "")]);
        add_runlevel(&layout, "default", &["sshd", "net"]);
        add_runlevel(&layout, "boot", &["clock"]);

        let runlevels = scan_runlevels(&layout).unwrap();
        let names: Vec<&str> = runlevels.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["boot", "default"]);

        let members: Vec<&str> = runlevels[1].members.iter().map(ServiceName::as_str).collect();
        assert_eq!(members, ["net", "sshd"]);
    }

    #[test]
    fn missing_runlevel_dir_is_empty_not_fatal() {
        let (_dir, layout) = layout_with_services(&[("sshd", "")]);

        assert!(scan_runlevels(&layout).unwrap().is_empty());
    }

    #[test]
    fn stamps_cover_services_runlevels_and_config() {
        let (_dir, layout) = layout_with_services(&[("sshd", "need net\n"), ("net", "")]);
        add_runlevel(&layout, "default", &["sshd"]);
        fs::write(layout.config_file(), "default_runlevel: default\n").unwrap();

        let stamps = source_stamps(&layout).unwrap();
        let paths: Vec<String> = stamps
            .iter()
            .map(|s| s.path.display().to_string())
            .collect();

        assert!(paths.iter().any(|p| p.ends_with("init.d")));
        assert!(paths.iter().any(|p| p.ends_with("sshd")));
        assert!(paths.iter().any(|p| p.ends_with("runlevels")));
        assert!(paths.iter().any(|p| p.ends_with("default")));
        assert!(paths.iter().any(|p| p.ends_with("config.yaml")));
    }

    #[test]
    fn stamps_skip_absent_config() {
        let (_dir, layout) = layout_with_services(&[("sshd", "")]);

        let stamps = source_stamps(&layout).unwrap();
        assert!(
            stamps
                .iter()
                .all(|s| !s.path.display().to_string().ends_with("config.yaml"))
        );
    }
}

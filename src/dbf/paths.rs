//! Filesystem name resolution for tables and their memo files.
//!
//! xBase files travel between case-insensitive and case-sensitive
//! filesystems, so `CUSTOMER.DBF` may be asked for as `customer.dbf` and its
//! memo may be `customer.FPT`. Resolution is a capability injected into
//! [`Table`](crate::dbf::table::Table) rather than hardcoded.

use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::trace;

/// Locates existing files on disk.
pub trait PathResolver: Debug + Send + Sync {
    /// Resolves `path` to an existing file.
    ///
    /// With `extension`, the extension of `path` is replaced first, which is
    /// how a sibling memo file is found.
    fn resolve(&self, path: &Path, extension: Option<&str>) -> Option<PathBuf>;
}

/// Matches every path component ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitive;

/// Requires the path to exist exactly as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exact;

fn with_extension(path: &Path, extension: Option<&str>) -> PathBuf {
    match extension {
        Some(ext) => path.with_extension(ext.trim_start_matches('.')),
        None => path.to_path_buf(),
    }
}

impl PathResolver for Exact {
    fn resolve(&self, path: &Path, extension: Option<&str>) -> Option<PathBuf> {
        let candidate = with_extension(path, extension);
        candidate.is_file().then_some(candidate)
    }
}

impl PathResolver for CaseInsensitive {
    fn resolve(&self, path: &Path, extension: Option<&str>) -> Option<PathBuf> {
        let candidate = with_extension(path, extension);
        if candidate.is_file() {
            return Some(candidate);
        }

        let mut resolved = PathBuf::new();
        for component in candidate.components() {
            match component {
                Component::Normal(name) => {
                    let exact = resolved.join(name);
                    if exact.exists() {
                        resolved = exact;
                    } else {
                        resolved = find_in_dir(&resolved, name)?;
                    }
                }
                other => resolved.push(other.as_os_str()),
            }
        }
        trace!("Resolved {} to {}", candidate.display(), resolved.display());
        resolved.is_file().then_some(resolved)
    }
}

/// Finds the entry of `dir` whose name equals `name` ignoring case.
fn find_in_dir(dir: &Path, name: &OsStr) -> Option<PathBuf> {
    let wanted = name.to_str()?.to_lowercase();
    let listing = if dir.as_os_str().is_empty() {
        fs::read_dir(".")
    } else {
        fs::read_dir(dir)
    };
    let mut matches: Vec<PathBuf> = listing
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|entry_name| entry_name.to_lowercase() == wanted)
        })
        .map(|entry| dir.join(entry.file_name()))
        .collect();
    // Directory order is unspecified; pick deterministically.
    matches.sort();
    matches.into_iter().next()
}

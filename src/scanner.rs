use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::info;
use walkdir::WalkDir;

use crate::utils;

/// Directory names that mark a Python virtual environment.
pub const VENV_MARKERS: &[&str] = &["venv", ".venv", "env"];

/// One virtual environment found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenvEntry {
    pub path: PathBuf,
    /// Filled in on first measurement, dropped with the entry on the next scan.
    pub size_bytes: Option<u64>,
}

impl VenvEntry {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            size_bytes: None,
        }
    }

    /// Size of the venv, measuring it the first time it is asked for.
    pub fn measure(&mut self) -> u64 {
        let path = &self.path;
        *self.size_bytes.get_or_insert_with(|| utils::dir_size(path))
    }
}

fn is_venv_name(name: &str) -> bool {
    VENV_MARKERS.contains(&name)
}

/// Whether the last component of `path` is one of the venv markers.
pub fn has_venv_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(is_venv_name)
}

/// Find every venv-named directory anywhere below `root`.
///
/// Matched directories are still descended into, so a venv nested inside
/// another is reported too. `root` itself is never reported. Symlinks are
/// neither matched nor followed, and unreadable branches are skipped.
/// Results are sorted.
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(root).min_depth(1).follow_links(false);

    let mut found: Vec<PathBuf> = utils::readable_entries(walker)
        .filter(|e| e.file_type().is_dir())
        .filter(|e| e.file_name().to_str().is_some_and(is_venv_name))
        .map(|e| e.into_path())
        .collect();

    found.sort();
    info!(root = %root.display(), count = found.len(), "scan complete");
    found
}

/// Measure every entry, in parallel across venvs.
pub fn measure_all(entries: &mut [VenvEntry]) {
    entries.par_iter_mut().for_each(|entry| {
        entry.measure();
    });
}

/// Case-insensitive substring filter on the path. An empty term matches all.
pub fn matches_filter(path: &Path, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    path.to_string_lossy()
        .to_lowercase()
        .contains(&term.to_lowercase())
}

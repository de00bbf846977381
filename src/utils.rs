use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::Error;

const MIB: u64 = 1_048_576;

/// Venvs above this many bytes are shown as large.
pub const LARGE_BYTES: u64 = 500 * MIB;

/// Venvs above this many bytes (and not large) are shown as medium.
pub const MEDIUM_BYTES: u64 = 100 * MIB;

/// Get the invoking user's home directory.
pub fn home_dir() -> Result<PathBuf, Error> {
    dirs::home_dir().ok_or(Error::NoHomeDir)
}

/// Drive a walk to completion, dropping every entry that cannot be read.
///
/// This is the skip-and-continue policy shared by scanning, measuring and
/// listing: a permission error or a file that vanished mid-walk removes that
/// entry (and, for a directory, everything below it) from the result and the
/// walk carries on. Nothing is reported to the caller.
pub fn readable_entries(walker: WalkDir) -> impl Iterator<Item = DirEntry> {
    walker.into_iter().filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            debug!(path = ?err.path(), error = %err, "skipping unreadable entry");
            None
        }
    })
}

/// Compute total size of a directory recursively.
///
/// Only regular files count. Symlinks are not followed, and a missing or
/// unreadable tree measures zero.
pub fn dir_size(path: &Path) -> u64 {
    readable_entries(WalkDir::new(path).follow_links(false))
        .filter(|e| e.file_type().is_file())
        .map(|e| e.metadata().map(|m| m.len()).unwrap_or(0))
        .sum()
}

/// Format byte count as human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes >= 1_073_741_824 {
        format!("{:.2} GB", bytes as f64 / 1_073_741_824.0)
    } else if bytes >= MIB {
        format!("{:.2} MB", bytes as f64 / MIB as f64)
    } else if bytes >= 1_024 {
        format!("{:.2} KB", bytes as f64 / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Shorten a path for display by replacing home dir with ~.
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => shorten_home(path, &home),
        None => path.display().to_string(),
    }
}

fn shorten_home(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(relative) => format!("~/{}", relative.display()),
        Err(_) => path.display().to_string(),
    }
}

/// Coarse size classification used to color venv rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBand {
    Small,
    Medium,
    Large,
}

impl SizeBand {
    pub fn of(bytes: u64) -> Self {
        if bytes > LARGE_BYTES {
            SizeBand::Large
        } else if bytes > MEDIUM_BYTES {
            SizeBand::Medium
        } else {
            SizeBand::Small
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeBand::Small => "small",
            SizeBand::Medium => "medium",
            SizeBand::Large => "large",
        }
    }
}

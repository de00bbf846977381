//! Flat listing of everything inside one venv.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::utils;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One entry below a venv root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    pub kind: EntryKind,
    pub relative_path: PathBuf,
}

impl ContentItem {
    /// Line shown in the contents pane: `[DIR]` prefix or file indent.
    pub fn display_line(&self) -> String {
        match self.kind {
            EntryKind::Directory => format!("[DIR] {}", self.relative_path.display()),
            EntryKind::File => format!("      {}", self.relative_path.display()),
        }
    }
}

/// List every directory and file below `venv`, relative to it.
///
/// Parents come before their children and siblings are sorted by name.
/// Anything that is not a directory, symlinks included, is a `File`.
/// A missing or unreadable venv lists as empty.
pub fn list_contents(venv: &Path) -> Vec<ContentItem> {
    let walker = WalkDir::new(venv)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    utils::readable_entries(walker)
        .filter_map(|entry| {
            let relative_path = entry.path().strip_prefix(venv).ok()?.to_path_buf();
            let kind = if entry.file_type().is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            Some(ContentItem {
                kind,
                relative_path,
            })
        })
        .collect()
}

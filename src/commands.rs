//! Headless front end: the `scan`, `show` and `clean` subcommands.

use std::path::{Path, PathBuf};

use crate::cleaner;
use crate::contents::{self, EntryKind};
use crate::output;
use crate::scanner::{self, VenvEntry};
use crate::utils;

/// Scan `root`, keep the venvs matching `filter`, and measure them.
fn scan_filtered(root: &Path, filter: Option<&str>) -> Vec<VenvEntry> {
    let filter = filter.unwrap_or("");
    let mut entries: Vec<VenvEntry> = scanner::scan(root)
        .into_iter()
        .filter(|p| scanner::matches_filter(p, filter))
        .map(VenvEntry::new)
        .collect();
    scanner::measure_all(&mut entries);
    entries
}

fn print_entries(entries: &[VenvEntry]) -> u64 {
    if entries.is_empty() {
        output::print_nothing_found();
        return 0;
    }

    let mut total = 0u64;
    for entry in entries {
        let size = entry.size_bytes.unwrap_or(0);
        total += size;
        output::print_venv(&utils::display_path(&entry.path), size);
    }
    output::print_total(entries.len(), total);
    total
}

/// Keep only explicit arguments named like a venv; warn about the rest.
fn venv_arguments(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let (venvs, refused): (Vec<PathBuf>, Vec<PathBuf>) =
        paths.into_iter().partition(|p| scanner::has_venv_name(p));
    for path in &refused {
        output::print_warning(&format!(
            "refusing {}: not named {}",
            path.display(),
            scanner::VENV_MARKERS.join(", ")
        ));
    }
    venvs
}

pub fn run_scan(root: &Path, filter: Option<&str>) {
    let entries = scan_filtered(root, filter);
    output::print_scan_header(&utils::display_path(root));
    print_entries(&entries);
}

pub fn run_show(venv: &Path) {
    let items = contents::list_contents(venv);
    if items.is_empty() {
        output::print_info(&format!("{} is empty or unreadable.", venv.display()));
        return;
    }
    for item in &items {
        output::print_content_line(&item.display_line(), item.kind == EntryKind::Directory);
    }
}

/// What a `clean` run did. `remaining` is the re-scan count after a
/// confirmed deletion and `None` for a dry run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub deleted: usize,
    pub freed: u64,
    pub remaining: Option<usize>,
}

pub fn run_clean(
    root: &Path,
    filter: Option<&str>,
    explicit: Vec<PathBuf>,
    confirm: bool,
) -> CleanSummary {
    let mut entries = if explicit.is_empty() {
        output::print_scan_header(&utils::display_path(root));
        scan_filtered(root, filter)
    } else {
        output::print_selection_header();
        venv_arguments(explicit)
            .into_iter()
            .map(VenvEntry::new)
            .collect()
    };
    scanner::measure_all(&mut entries);
    print_entries(&entries);

    let mut summary = CleanSummary::default();
    if entries.is_empty() {
        return summary;
    }
    if !confirm {
        output::print_dry_run_footer();
        return summary;
    }

    let paths: Vec<PathBuf> = entries.into_iter().map(|e| e.path).collect();
    for outcome in cleaner::delete_all(&paths) {
        let shown = utils::display_path(&outcome.path);
        match &outcome.error {
            None => {
                summary.deleted += 1;
                summary.freed += outcome.freed_bytes;
                output::print_deleted(&shown, outcome.freed_bytes);
            }
            Some(err) => output::print_delete_error(&shown, &err.to_string()),
        }
    }
    println!();
    output::print_clean_complete(summary.deleted, summary.freed);

    let remaining = scanner::scan(root).len();
    output::print_info(&format!("{remaining} venv(s) remain under {}.", utils::display_path(root)));
    summary.remaining = Some(remaining);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_home() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("api").join(".venv").join("lib")).unwrap();
        fs::write(root.join("api").join(".venv").join("pyvenv.cfg"), vec![0u8; 40]).unwrap();
        fs::create_dir_all(root.join("web").join("venv")).unwrap();
        fs::write(root.join("web").join("venv").join("pyvenv.cfg"), vec![0u8; 60]).unwrap();
        fs::create_dir_all(root.join("Documents")).unwrap();
        fs::write(root.join("Documents").join("notes.txt"), b"keep").unwrap();
        dir
    }

    #[test]
    fn clean_without_confirm_deletes_nothing() {
        let dir = create_home();
        let summary = run_clean(dir.path(), None, vec![], false);

        assert_eq!(summary, CleanSummary::default());
        assert!(dir.path().join("api").join(".venv").exists());
        assert!(dir.path().join("web").join("venv").exists());
    }

    #[test]
    fn clean_with_confirm_deletes_and_rescans() {
        let dir = create_home();
        let summary = run_clean(dir.path(), None, vec![], true);

        assert_eq!(summary.deleted, 2);
        assert_eq!(summary.freed, 100);
        assert_eq!(summary.remaining, Some(0));
        assert!(!dir.path().join("api").join(".venv").exists());
        assert!(!dir.path().join("web").join("venv").exists());
        assert!(dir.path().join("Documents").join("notes.txt").exists());
    }

    #[test]
    fn clean_with_filter_keeps_other_venvs() {
        let dir = create_home();
        let summary = run_clean(dir.path(), Some("API/.VENV"), vec![], true);

        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.remaining, Some(1));
        assert!(!dir.path().join("api").join(".venv").exists());
        assert!(dir.path().join("web").join("venv").exists());
    }

    #[test]
    fn clean_refuses_explicit_non_venv_directory() {
        let dir = create_home();
        let documents = dir.path().join("Documents");
        let venv = dir.path().join("web").join("venv");

        let summary = run_clean(dir.path(), None, vec![documents.clone(), venv.clone()], true);

        assert_eq!(summary.deleted, 1);
        assert!(documents.join("notes.txt").exists());
        assert!(!venv.exists());
    }

    #[test]
    fn clean_with_only_refused_arguments_does_nothing() {
        let dir = create_home();
        let documents = dir.path().join("Documents");

        let summary = run_clean(dir.path(), None, vec![documents.clone()], true);

        assert_eq!(summary, CleanSummary::default());
        assert!(documents.exists());
    }
}

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DeleteError;
use crate::utils;

/// Result of removing one venv in a batch.
#[derive(Debug)]
pub struct DeletionOutcome {
    pub path: PathBuf,
    /// Size measured just before removal; zero when removal failed.
    pub freed_bytes: u64,
    pub error: Option<DeleteError>,
}

impl DeletionOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Remove every venv in `paths`, one outcome per path in input order.
///
/// The caller is responsible for confirmation. A failure on one path is
/// recorded and the rest of the batch still runs.
pub fn delete_all(paths: &[PathBuf]) -> Vec<DeletionOutcome> {
    let outcomes: Vec<DeletionOutcome> = paths.iter().map(|p| delete_one(p)).collect();

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    let freed: u64 = outcomes.iter().map(|o| o.freed_bytes).sum();
    info!(
        requested = paths.len(),
        failed,
        freed = %utils::format_size(freed),
        "deletion batch finished"
    );
    outcomes
}

fn delete_one(path: &Path) -> DeletionOutcome {
    match remove_venv(path) {
        Ok(freed_bytes) => DeletionOutcome {
            path: path.to_path_buf(),
            freed_bytes,
            error: None,
        },
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to delete venv");
            DeletionOutcome {
                path: path.to_path_buf(),
                freed_bytes: 0,
                error: Some(err),
            }
        }
    }
}

/// Remove a venv directory tree. Returns bytes freed on success.
///
/// Only real directories are removed; a symlink or regular file is refused.
/// A permission failure gets one retry after owner access is restored on
/// the tree. If the retry fails too, whatever is left of the tree gets its
/// original permissions back.
fn remove_venv(path: &Path) -> Result<u64, DeleteError> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(DeleteError::NotFound),
        Err(e) => return Err(e.into()),
    };
    if !meta.is_dir() {
        return Err(DeleteError::NotADirectory);
    }

    let size = utils::dir_size(path);
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(size),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            debug!(path = %path.display(), "permission denied, restoring access and retrying");
            let changed = make_tree_writable(path);
            if let Err(e) = fs::remove_dir_all(path) {
                put_back(&changed);
                return Err(e.into());
            }
            Ok(size)
        }
        Err(e) => Err(e.into()),
    }
}

/// Unlock every directory (and, off unix, read-only file) in the tree.
/// Returns the original permissions of each entry that was changed.
fn make_tree_writable(dir: &Path) -> Vec<(PathBuf, fs::Permissions)> {
    let mut changed = Vec::new();
    unlock_tree(dir, &mut changed);
    changed
}

// Permissions are fixed before descending so that locked directories
// become listable.
fn unlock_tree(dir: &Path, changed: &mut Vec<(PathBuf, fs::Permissions)>) {
    if let Some(original) = unlock(dir) {
        changed.push((dir.to_path_buf(), original));
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        match entry.file_type() {
            Ok(t) if t.is_dir() => unlock_tree(&entry.path(), changed),
            Ok(t) if t.is_file() => {
                let path = entry.path();
                if let Some(original) = unlock(&path) {
                    changed.push((path, original));
                }
            }
            _ => {}
        }
    }
}

/// Deepest entries first; anything already removed is skipped.
fn put_back(changed: &[(PathBuf, fs::Permissions)]) {
    for (path, original) in changed.iter().rev() {
        let _ = fs::set_permissions(path, original.clone());
    }
}

#[cfg(unix)]
fn unlock(path: &Path) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    // Unlinking only needs rights on the parent directory.
    let meta = fs::symlink_metadata(path).ok()?;
    let original = meta.permissions();
    if !meta.is_dir() || original.mode() & 0o700 == 0o700 {
        return None;
    }
    let mut perms = original.clone();
    perms.set_mode(original.mode() | 0o700);
    fs::set_permissions(path, perms).ok()?;
    Some(original)
}

#[cfg(not(unix))]
fn unlock(path: &Path) -> Option<fs::Permissions> {
    let meta = fs::symlink_metadata(path).ok()?;
    let original = meta.permissions();
    if !original.readonly() {
        return None;
    }
    let mut perms = original.clone();
    perms.set_readonly(false);
    fs::set_permissions(path, perms).ok()?;
    Some(original)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{self, VenvEntry};
    use std::fs::File;
    use tempfile::TempDir;

    fn make_venv(root: &Path, rel: &str, files: &[(&str, u64)]) -> PathBuf {
        let venv = root.join(rel);
        fs::create_dir_all(venv.join("lib")).unwrap();
        for (name, len) in files {
            let f = File::create(venv.join("lib").join(name)).unwrap();
            f.set_len(*len).unwrap();
        }
        venv
    }

    #[test]
    fn deletes_existing_and_reports_missing() {
        let dir = TempDir::new().unwrap();
        let a = make_venv(dir.path(), "a/venv", &[("x.py", 10), ("y.py", 20)]);
        let b = dir.path().join("b").join(".venv");

        let outcomes = delete_all(&[a.clone(), b.clone()]);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].path, a);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[0].freed_bytes, 30);
        assert!(!a.exists());

        assert_eq!(outcomes[1].path, b);
        assert!(matches!(outcomes[1].error, Some(DeleteError::NotFound)));
        assert_eq!(outcomes[1].freed_bytes, 0);
    }

    #[test]
    fn failure_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone").join("env");
        let first = make_venv(dir.path(), "one/env", &[("a", 1)]);
        let last = make_venv(dir.path(), "two/env", &[("b", 2)]);

        let outcomes = delete_all(&[first.clone(), missing, last.clone()]);

        let ok: Vec<bool> = outcomes.iter().map(|o| o.is_ok()).collect();
        assert_eq!(ok, vec![true, false, true]);
        assert!(!first.exists());
        assert!(!last.exists());
    }

    #[test]
    fn empty_batch_yields_no_outcomes() {
        assert!(delete_all(&[]).is_empty());
    }

    #[test]
    fn refuses_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("venv");
        fs::write(&file, b"not a dir").unwrap();

        let outcomes = delete_all(&[file.clone()]);
        assert!(matches!(outcomes[0].error, Some(DeleteError::NotADirectory)));
        assert!(file.exists());
    }

    #[cfg(unix)]
    #[test]
    fn refuses_symlink_and_keeps_target() {
        let dir = TempDir::new().unwrap();
        let target = make_venv(dir.path(), "real/.venv", &[("keep.py", 5)]);
        let link = dir.path().join("venv");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let outcomes = delete_all(&[link.clone()]);
        assert!(matches!(outcomes[0].error, Some(DeleteError::NotADirectory)));
        assert!(target.join("lib").join("keep.py").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_inside_tree_is_removed_without_touching_target() {
        let dir = TempDir::new().unwrap();
        let outside = dir.path().join("outside.txt");
        fs::write(&outside, b"keep me").unwrap();
        let venv = make_venv(dir.path(), "p/.venv", &[]);
        std::os::unix::fs::symlink(&outside, venv.join("lib").join("link")).unwrap();

        let outcomes = delete_all(&[venv.clone()]);
        assert!(outcomes[0].is_ok());
        assert!(!venv.exists());
        assert_eq!(fs::read(&outside).unwrap(), b"keep me");
    }

    #[cfg(unix)]
    #[test]
    fn removes_tree_with_read_only_directories() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let venv = make_venv(dir.path(), "p/venv", &[("locked.py", 3)]);
        let lib = venv.join("lib");
        fs::set_permissions(&lib, fs::Permissions::from_mode(0o500)).unwrap();

        let outcomes = delete_all(&[venv.clone()]);
        if !outcomes[0].is_ok() {
            let _ = fs::set_permissions(&lib, fs::Permissions::from_mode(0o755));
        }
        assert!(outcomes[0].is_ok(), "{:?}", outcomes[0].error);
        assert!(!venv.exists());
    }

    #[cfg(unix)]
    #[test]
    fn failed_retry_puts_permissions_back() {
        use std::os::unix::fs::PermissionsExt;

        if unsafe { libc::geteuid() } == 0 {
            return;
        }
        let dir = TempDir::new().unwrap();
        let venv = make_venv(dir.path(), "p/venv", &[("a.py", 3)]);
        let parent = dir.path().join("p");
        fs::set_permissions(&venv, fs::Permissions::from_mode(0o500)).unwrap();
        fs::set_permissions(&parent, fs::Permissions::from_mode(0o500)).unwrap();

        let outcomes = delete_all(&[venv.clone()]);
        let mode_after = fs::symlink_metadata(&venv).unwrap().permissions().mode() & 0o777;

        fs::set_permissions(&parent, fs::Permissions::from_mode(0o755)).unwrap();
        fs::set_permissions(&venv, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(outcomes[0].error, Some(DeleteError::Io(_))));
        assert!(venv.exists());
        assert_eq!(mode_after, 0o500);
    }

    #[test]
    fn scan_measure_delete_rescan() {
        const MB: u64 = 1_048_576;
        let dir = TempDir::new().unwrap();
        let home = dir.path();
        let small = make_venv(
            home,
            "proj/.venv",
            &[("a.so", 10 * MB), ("b.so", 10 * MB), ("c.so", 10 * MB)],
        );
        let big = make_venv(home, "other/venv", &[("torch.so", 600 * MB)]);

        let found = scanner::scan(home);
        assert_eq!(found, {
            let mut expected = vec![small.clone(), big.clone()];
            expected.sort();
            expected
        });

        let mut entries: Vec<VenvEntry> = found.into_iter().map(VenvEntry::new).collect();
        scanner::measure_all(&mut entries);
        let size_of = |p: &Path| entries.iter().find(|e| e.path == p).unwrap().size_bytes;
        assert_eq!(size_of(&small), Some(30 * MB));
        assert_eq!(size_of(&big), Some(600 * MB));

        let outcomes = delete_all(&[big.clone()]);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[0].freed_bytes, 600 * MB);

        assert_eq!(scanner::scan(home), vec![small]);
    }
}

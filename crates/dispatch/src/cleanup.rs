use std::path::{Path, PathBuf};

use walk::FileKind;

use crate::DispatchError;

/// Reclaims every path in `registry` (spec.md §4.F).
///
/// Sorts lexicographically and processes from the tail, which unlinks
/// deeper/child names before their parents for this naming scheme. A path
/// that has already vanished is skipped without being counted as a failure.
/// Returns the paths that could not be reclaimed (the residue).
///
/// # Errors
///
/// Never returns `Err` for a vanished path; returns [`DispatchError::Fs`]
/// only if a path classifies as something other than `Dir`, `Reg`, or
/// `Symlink`, which indicates a bug in whatever created it.
pub fn reclaim(registry: Vec<PathBuf>) -> Result<Vec<PathBuf>, DispatchError> {
    let mut remaining = registry;
    remaining.sort();

    let mut residue = Vec::new();
    while let Some(path) = remaining.pop() {
        match walk::classify(&path) {
            Err(_) => continue, // vanished; not a failure
            Ok(FileKind::Dir) => {
                if std::fs::remove_dir(&path).is_err() {
                    residue.push(path);
                }
            }
            Ok(FileKind::Reg | FileKind::Symlink) => {
                if std::fs::remove_file(&path).is_err() {
                    residue.push(path);
                }
            }
            Ok(other) => {
                return Err(DispatchError::Configuration(format!(
                    "{}: unexpected kind {other:?} in write-path registry",
                    path.display()
                )));
            }
        }
    }
    Ok(residue)
}

/// Collects every entry directly under `root` whose basename begins with
/// `dirload_<base>`, for the `clean_write_paths` one-shot startup action
/// (spec.md §6's "collect-and-clean pass").
pub fn collect_existing(root: &Path, base: &str) -> std::io::Result<Vec<PathBuf>> {
    let prefix = format!("dirload_{base}");
    let mut found = Vec::new();
    walk::walk(root, |path| {
        if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
        {
            found.push(path.to_path_buf());
        }
        Ok(walk::WalkControl::Continue)
    })
    .map_err(|e| match e {
        walk::FsError::Io { source, .. } => source,
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reclaim_removes_files_and_dirs_tolerating_vanished() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("dirload_x_gid0_20240101000000_0");
        std::fs::write(&file, b"x").unwrap();
        let vanished = dir.path().join("dirload_x_gid0_20240101000000_1");

        let residue = reclaim(vec![file.clone(), vanished]).unwrap();

        assert!(residue.is_empty());
        assert!(!file.exists());
    }

    #[test]
    fn collect_existing_finds_prefixed_entries_only() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("dirload_x_gid0_20240101000000_0"), b"x").unwrap();
        std::fs::write(dir.path().join("keep"), b"x").unwrap();

        let found = collect_existing(dir.path(), "x").unwrap();

        assert_eq!(found.len(), 1);
        assert!(found[0].ends_with("dirload_x_gid0_20240101000000_0"));
    }
}

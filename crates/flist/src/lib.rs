#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `flist` turns input roots into the per-root sequences of absolute paths
//! that `dirload` workers iterate over, and reads/writes the newline
//! delimited on-disk flist file format.
//!
//! # Design
//!
//! [`build_for_root`] walks a single root with [`walk::walk`] and applies the
//! dot-path and kind filtering rules from spec.md §4.C. [`distribute`] takes
//! a flat line list (as read from a pre-recorded flist file) and assigns
//! each line to every root that is a path-prefix of it, matching upstream's
//! "multi-root membership" semantics (a path may thus appear in more than
//! one root's flist).
//!
//! # Invariants
//!
//! - Every path produced here is absolute, matching [`walk::assert_file_path`].
//! - A built or distributed flist that ends up empty for some root is a
//!   build failure ([`FlistError::Empty`]), checked by the caller before any
//!   worker starts.
//!
//! # Errors
//!
//! [`FlistError`] wraps I/O failures during walking or file access, and the
//! two build-time rejections from spec.md §4.C: an unclassifiable entry, and
//! a flist-file line that matches no configured root.

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use walk::{FileKind, FsError, WalkControl, classify, is_dot_path, walk};

/// Errors surfaced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FlistError {
    /// An underlying filesystem operation failed.
    #[error(transparent)]
    Fs(#[from] FsError),
    /// Reading or writing the flist file itself failed.
    #[error("{path}: {source}")]
    Io {
        /// The flist file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// An entry classified as [`FileKind::Invalid`] during a walk.
    #[error("{0}: invalid file type")]
    InvalidEntry(PathBuf),
    /// A root's resulting flist (or a distributed subset) was empty.
    #[error("{0}: empty flist")]
    Empty(PathBuf),
    /// A flist-file line matched none of the configured roots.
    #[error("{0}: matches no configured root")]
    NoMatchingRoot(PathBuf),
    /// The flist file already exists and `--force` was not given.
    #[error("{0}: exists")]
    AlreadyExists(PathBuf),
}

/// Builds the flist for a single `root` by walking it.
///
/// Regular files and symlinks are kept, in the order the walk visits them.
/// Directories, devices, and unsupported kinds are dropped. When
/// `ignore_dot` is set, non-directory entries whose path is a
/// [`walk::is_dot_path`] are also dropped — directories are never skipped by
/// this rule, only stepped over for membership, so a `.git` directory is
/// still descended into.
pub fn build_for_root(root: &Path, ignore_dot: bool) -> Result<Vec<PathBuf>, FlistError> {
    let mut entries = Vec::new();
    let mut invalid: Option<PathBuf> = None;

    walk(root, |path| {
        let kind = classify(path)?;
        match kind {
            FileKind::Dir => {}
            FileKind::Reg | FileKind::Symlink => {
                if !(ignore_dot && is_dot_path(path)) {
                    entries.push(path.to_path_buf());
                }
            }
            FileKind::Device | FileKind::Unsupported => {}
            FileKind::Invalid => {
                invalid = Some(path.to_path_buf());
                return Ok(WalkControl::Stop);
            }
        }
        Ok(WalkControl::Continue)
    })
    .map_err(FlistError::Fs)?;

    if let Some(path) = invalid {
        return Err(FlistError::InvalidEntry(path));
    }
    Ok(entries)
}

/// Distributes flat `lines` (as read from a flist file) across `roots`,
/// assigning each line to every root that is a path-prefix of it.
///
/// Returns one `Vec<PathBuf>` per root, in the same order as `roots`. A line
/// matching no root is a build failure.
pub fn distribute(lines: &[PathBuf], roots: &[PathBuf]) -> Result<Vec<Vec<PathBuf>>, FlistError> {
    let mut per_root: Vec<Vec<PathBuf>> = roots.iter().map(|_| Vec::new()).collect();
    for line in lines {
        let mut matched = false;
        for (root, bucket) in roots.iter().zip(per_root.iter_mut()) {
            if line.starts_with(root) {
                bucket.push(line.clone());
                matched = true;
            }
        }
        if !matched {
            return Err(FlistError::NoMatchingRoot(line.clone()));
        }
    }
    Ok(per_root)
}

/// Removes duplicate entries from `input`, keeping the first occurrence of
/// each (spec.md T3).
pub fn dedup_preserve_order(input: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(input.len());
    for item in input {
        if seen.insert(item.clone()) {
            out.push(item.clone());
        }
    }
    out
}

/// Reads a flist file, one absolute path per line, trailing newline stripped.
pub fn load_file(path: &Path) -> Result<Vec<PathBuf>, FlistError> {
    let file = std::fs::File::open(path).map_err(|e| io_err(path, e))?;
    let reader = BufReader::new(file);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| io_err(path, e))?;
        out.push(PathBuf::from(line));
    }
    Ok(out)
}

/// Writes `lines` to `path`, sorted, one per line, newline-terminated.
///
/// Refuses to overwrite an existing file unless `force` is set, in which
/// case the existing file is removed first.
pub fn write_file(path: &Path, lines: &[PathBuf], force: bool) -> Result<(), FlistError> {
    if path.exists() {
        if force {
            std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
        } else {
            return Err(FlistError::AlreadyExists(path.to_path_buf()));
        }
    }

    let mut sorted: Vec<&PathBuf> = lines.iter().collect();
    sorted.sort();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    let mut writer = BufWriter::new(file);
    for line in sorted {
        writeln!(writer, "{}", line.display()).map_err(|e| io_err(path, e))?;
    }
    writer.flush().map_err(|e| io_err(path, e))
}

fn io_err(path: &Path, source: std::io::Error) -> FlistError {
    FlistError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn build_for_root_keeps_files_and_symlinks_drops_dirs() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/a"), b"x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("sub/a"), dir.path().join("lnk")).unwrap();

        let out = build_for_root(dir.path(), false).unwrap();
        assert!(out.contains(&dir.path().join("sub/a")));
        assert!(!out.contains(&dir.path().join("sub")));
        #[cfg(unix)]
        assert!(out.contains(&dir.path().join("lnk")));
    }

    #[test]
    fn build_for_root_ignore_dot_drops_only_non_directory_dot_entries() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join(".git/config"), b"x").unwrap();
        std::fs::write(dir.path().join("keep"), b"x").unwrap();

        let out = build_for_root(dir.path(), true).unwrap();
        assert!(!out.contains(&dir.path().join(".git/config")));
        assert!(out.contains(&dir.path().join("keep")));
    }

    #[test]
    fn distribute_assigns_line_to_matching_root_only() {
        let roots = vec![PathBuf::from("/a"), PathBuf::from("/b")];
        let lines = vec![PathBuf::from("/a/x"), PathBuf::from("/b/y")];
        let per_root = distribute(&lines, &roots).unwrap();
        assert_eq!(per_root[0], vec![PathBuf::from("/a/x")]);
        assert_eq!(per_root[1], vec![PathBuf::from("/b/y")]);
    }

    #[test]
    fn distribute_rejects_unmatched_line() {
        let roots = vec![PathBuf::from("/a")];
        let lines = vec![PathBuf::from("/c/x")];
        assert!(matches!(
            distribute(&lines, &roots),
            Err(FlistError::NoMatchingRoot(_))
        ));
    }

    #[test]
    fn dedup_preserves_first_occurrence_order() {
        let input = vec![
            PathBuf::from("/a"),
            PathBuf::from("/b"),
            PathBuf::from("/a"),
            PathBuf::from("/c"),
        ];
        assert_eq!(
            dedup_preserve_order(&input),
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn write_then_load_round_trips_sorted() {
        let dir = tempdir().unwrap();
        let flist_path = dir.path().join("flist.txt");
        let lines = vec![PathBuf::from("/b"), PathBuf::from("/a")];
        write_file(&flist_path, &lines, false).unwrap();
        let loaded = load_file(&flist_path).unwrap();
        assert_eq!(loaded, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }

    #[test]
    fn write_file_refuses_overwrite_without_force() {
        let dir = tempdir().unwrap();
        let flist_path = dir.path().join("flist.txt");
        write_file(&flist_path, &[PathBuf::from("/a")], false).unwrap();
        assert!(matches!(
            write_file(&flist_path, &[PathBuf::from("/b")], false),
            Err(FlistError::AlreadyExists(_))
        ));
    }

    #[test]
    fn write_file_force_removes_existing_first() {
        let dir = tempdir().unwrap();
        let flist_path = dir.path().join("flist.txt");
        write_file(&flist_path, &[PathBuf::from("/a")], false).unwrap();
        write_file(&flist_path, &[PathBuf::from("/b")], true).unwrap();
        assert_eq!(load_file(&flist_path).unwrap(), vec![PathBuf::from("/b")]);
    }
}

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the typed filesystem primitives `dirload`'s worker core is
//! built on: classifying an entry's [`FileKind`], creating an inode of a
//! requested kind, fsyncing a path, probing directory writability, and a
//! lazy, interruptible pre-order directory walk.
//!
//! # Design
//!
//! Every operation here is a thin, typed wrapper around a single syscall or a
//! short fixed sequence of them. None of them retry and none of them buffer
//! more than one directory's worth of entries at a time — [`walk`] yields one
//! path per call to its visitor so a caller can probe cancellation between
//! entries, which rules out a batching walker.
//!
//! # Invariants
//!
//! - Every path this crate hands back or accepts is absolute and does not end
//!   with the platform separator; violating this is a caller bug, asserted
//!   with [`assert_file_path`].
//! - [`classify`] never follows a symlink; [`classify_follow`] always does.
//! - [`walk`] never revisits the same symlink target — callers resolve at
//!   most one level of indirection themselves via [`classify_follow`].
//!
//! # Errors
//!
//! All operations return [`FsError`], which wraps the underlying
//! [`std::io::Error`] together with the path that produced it so diagnostics
//! printed by higher layers can name the offending file.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

mod classify;
mod create;
mod dotpath;
mod walker;
mod writable;

pub use classify::{FileKind, classify, classify_follow, exists};
pub use dotpath::is_dot_path;
pub use walker::{WalkControl, walk};
pub use writable::is_dir_writable;

/// Errors surfaced by every operation in this crate.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// An I/O operation failed against a specific path.
    #[error("{path}: {source}")]
    Io {
        /// The path the operation was attempted against.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl FsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wraps an I/O error with the path that produced it.
    ///
    /// Public so callers outside this crate (the `worker` state machines,
    /// which perform their own `open`/`read_link` calls) can report failures
    /// through the same error type.
    #[must_use]
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::io(path, source)
    }
}

/// Asserts that `path` is absolute and has no trailing separator.
///
/// This is a programmer-visible invariant (spec.md P1): callers that hand in
/// a relative path or a path ending in `/` have a bug, not a recoverable
/// error condition.
pub fn assert_file_path(path: &Path) {
    assert!(path.is_absolute(), "path must be absolute: {}", path.display());
    let s = path.to_string_lossy();
    assert!(
        s.len() == 1 || !s.ends_with('/'),
        "path must not end with a separator: {s}"
    );
}

/// Requested kind for [`create`], including the hardlink pseudo-kind that
/// never appears as an observed [`FileKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CreateKind {
    /// Create a directory.
    Dir,
    /// Create an empty regular file.
    Reg,
    /// Create a symlink whose target text is the `old` path.
    Symlink,
    /// Create a hard link to `old` (falls back to [`CreateKind::Dir`] when
    /// `old` is not a regular file).
    Link,
}

/// Creates a new inode at `new_path` per spec.md §4.A.
///
/// `old_path` supplies the hardlink/symlink target; it is otherwise unused.
pub fn create(old_path: &Path, new_path: &Path, kind: CreateKind) -> Result<FileKind, FsError> {
    let kind = if matches!(kind, CreateKind::Link) && classify(old_path)? != FileKind::Reg {
        CreateKind::Dir
    } else {
        kind
    };

    match kind {
        CreateKind::Link => {
            fs::hard_link(old_path, new_path).map_err(|e| FsError::io(new_path, e))?;
            Ok(FileKind::Reg)
        }
        CreateKind::Dir => {
            create::mkdir(new_path)?;
            Ok(FileKind::Dir)
        }
        CreateKind::Reg => {
            create::mkfile(new_path)?;
            Ok(FileKind::Reg)
        }
        CreateKind::Symlink => {
            create::symlink(old_path, new_path)?;
            Ok(FileKind::Symlink)
        }
    }
}

/// Opens `path` and flushes it to stable storage.
///
/// For a directory this opens it read-only and calls `sync_all`, which is
/// the directory-fsync spec.md §4.A calls for.
pub fn fsync(path: &Path) -> Result<(), FsError> {
    let file = File::open(path).map_err(|e| FsError::io(path, e))?;
    file.sync_all().map_err(|e| FsError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "must be absolute")]
    fn assert_file_path_rejects_relative() {
        assert_file_path(Path::new("relative/path"));
    }

    #[test]
    #[should_panic(expected = "must not end with a separator")]
    fn assert_file_path_rejects_trailing_slash() {
        assert_file_path(Path::new("/abs/path/"));
    }

    #[test]
    fn assert_file_path_accepts_root() {
        assert_file_path(Path::new("/"));
    }

    #[test]
    fn assert_file_path_accepts_absolute() {
        assert_file_path(Path::new("/abs/path"));
    }
}

use std::path::PathBuf;

use walk::FsError;

/// Errors surfaced by [`crate::read_entry`] and [`crate::write_entry`].
///
/// Sentinel interrupt/deadline unwinding is modeled by the caller (the
/// supervisor loop), not by this type — these are genuine failures.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A filesystem primitive failed.
    #[error(transparent)]
    Fs(#[from] FsError),
    /// An entry classified as `Invalid`, fatal per spec.md §4.D.
    #[error("{0}: invalid file type")]
    InvalidKind(PathBuf),
}

use std::path::Path;

use walk::{FileKind, assert_file_path, classify, is_dot_path};

use crate::WorkerError;
use crate::state::WorkerState;

/// Runs the preamble shared by [`crate::read_entry`] and [`crate::write_entry`]
/// (spec.md §4.D): assert the path is well-formed, classify it, count the
/// stat, and apply the dot-path filter.
///
/// Returns `Ok(None)` when the entry was dropped by the dot-path rule;
/// callers should treat that as "nothing left to do, not an error".
pub(crate) fn preamble(state: &mut WorkerState, path: &Path, ignore_dot: bool) -> Result<Option<FileKind>, WorkerError> {
    assert_file_path(path);
    let kind = classify(path)?;
    state.stats.num_stat += 1;

    if ignore_dot && kind != FileKind::Dir && is_dot_path(path) {
        return Ok(None);
    }
    Ok(Some(kind))
}

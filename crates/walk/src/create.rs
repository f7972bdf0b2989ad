use std::path::Path;

use crate::FsError;

/// Directory mode used by [`crate::create`]'s `Dir` case.
///
/// Upstream `dirload` emits this literal `0644` rather than the conventional
/// `0755`; spec.md §9 flags this explicitly and instructs implementations to
/// preserve it unless the target filesystem refuses it. We preserve it.
#[cfg(unix)]
const DIR_MODE: u32 = 0o644;

#[cfg(unix)]
pub(crate) fn mkdir(path: &Path) -> Result<(), FsError> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .mode(DIR_MODE)
        .create(path)
        .map_err(|e| FsError::io(path, e))
}

#[cfg(not(unix))]
pub(crate) fn mkdir(path: &Path) -> Result<(), FsError> {
    std::fs::create_dir(path).map_err(|e| FsError::io(path, e))
}

pub(crate) fn mkfile(path: &Path) -> Result<(), FsError> {
    std::fs::File::create(path)
        .map(|_| ())
        .map_err(|e| FsError::io(path, e))
}

#[cfg(unix)]
pub(crate) fn symlink(target: &Path, link: &Path) -> Result<(), FsError> {
    std::os::unix::fs::symlink(target, link).map_err(|e| FsError::io(link, e))
}

#[cfg(not(unix))]
pub(crate) fn symlink(target: &Path, link: &Path) -> Result<(), FsError> {
    std::os::windows::fs::symlink_file(target, link).map_err(|e| FsError::io(link, e))
}

use std::fs::Metadata;
use std::path::Path;

use crate::FsError;

/// The kind of filesystem object an entry resolves to.
///
/// `Link` never appears here — it only exists as a request to [`crate::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A directory.
    Dir,
    /// A regular file.
    Reg,
    /// A block or character device.
    Device,
    /// A symlink, not yet resolved.
    Symlink,
    /// Anything else the platform reports (fifo, socket, ...).
    Unsupported,
    /// The lookup itself failed; callers treat this as fatal.
    Invalid,
}

fn kind_of(meta: &Metadata) -> FileKind {
    let ty = meta.file_type();
    if ty.is_dir() {
        FileKind::Dir
    } else if ty.is_file() {
        FileKind::Reg
    } else if ty.is_symlink() {
        FileKind::Symlink
    } else if is_device(&ty) {
        FileKind::Device
    } else {
        FileKind::Unsupported
    }
}

#[cfg(unix)]
fn is_device(ty: &std::fs::FileType) -> bool {
    use std::os::unix::fs::FileTypeExt;
    ty.is_block_device() || ty.is_char_device()
}

#[cfg(not(unix))]
fn is_device(_ty: &std::fs::FileType) -> bool {
    false
}

/// Classifies `path` without following a trailing symlink.
///
/// Returns [`FileKind::Invalid`] together with the lookup error when the
/// path cannot be stat'd at all.
pub fn classify(path: &Path) -> Result<FileKind, FsError> {
    match path.symlink_metadata() {
        Ok(meta) => Ok(kind_of(&meta)),
        Err(source) => Err(FsError::io(path, source)),
    }
}

/// Classifies `path`, following a trailing symlink.
///
/// Used after a symlink target has already been resolved to an absolute
/// path, to classify what it ultimately points at.
pub fn classify_follow(path: &Path) -> Result<FileKind, FsError> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(kind_of(&meta)),
        Err(source) => Err(FsError::io(path, source)),
    }
}

/// Returns whether `path` exists, based on a non-dereferencing stat.
pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn classifies_dir_and_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"x").unwrap();

        assert_eq!(classify(dir.path()).unwrap(), FileKind::Dir);
        assert_eq!(classify(&file).unwrap(), FileKind::Reg);
    }

    #[test]
    fn classify_missing_is_err() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(classify(&missing).is_err());
        assert!(!exists(&missing));
    }

    #[cfg(unix)]
    #[test]
    fn classify_does_not_follow_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, b"x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        assert_eq!(classify(&link).unwrap(), FileKind::Symlink);
        assert_eq!(classify_follow(&link).unwrap(), FileKind::Reg);
    }
}

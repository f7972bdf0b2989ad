use std::path::Path;

use crate::FsError;
use crate::classify::FileKind;

/// Probes whether `dir` is writable by creating and removing a temporary
/// subdirectory prefixed `dirload_write_test_`.
///
/// Returns `Ok(false)` when the temporary directory cannot be created (the
/// target is treated as read-only, not an error). Returns `Err` only if
/// removal of the successfully created probe directory fails, or if `dir`
/// does not classify as [`FileKind::Dir`].
pub fn is_dir_writable(dir: &Path) -> Result<bool, FsError> {
    match crate::classify::classify(dir)? {
        FileKind::Dir => {}
        _ => {
            return Err(FsError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
            ));
        }
    }

    let probe = match tempfile_dir_in(dir) {
        Ok(p) => p,
        Err(_) => return Ok(false),
    };
    std::fs::remove_dir(&probe).map_err(|e| FsError::io(&probe, e))?;
    Ok(true)
}

fn tempfile_dir_in(dir: &Path) -> std::io::Result<std::path::PathBuf> {
    for attempt in 0..8u32 {
        let candidate = dir.join(format!("dirload_write_test_{}{attempt}", std::process::id()));
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        "could not allocate a unique probe directory",
    ))
}

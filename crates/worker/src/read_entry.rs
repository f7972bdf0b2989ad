use std::path::Path;

use rand::Rng;
use walk::{FileKind, classify_follow};

use crate::WorkerError;
use crate::preamble::preamble;
use crate::state::WorkerState;

/// Knobs [`read_entry`] consults; stable across a whole run.
#[derive(Debug, Clone, Copy)]
pub struct ReadConfig {
    /// Drop non-directory dot entries instead of reading them.
    pub ignore_dot: bool,
    /// Classify and count but never open a body.
    pub stat_only: bool,
    /// Whether to read through a resolved symlink's target.
    pub follow_symlink: bool,
    /// `-1` = read to EOF, `0` = draw a fresh uniform size per open,
    /// `>0` = exact residual to read.
    pub read_size: i64,
}

/// Runs the read-entry state machine (spec.md §4.D.1) against `path`.
///
/// Always increments `numStat` for the visited path; a symlink that is
/// resolved and followed increments it a second time for the target.
pub fn read_entry(state: &mut WorkerState, path: &Path, cfg: &ReadConfig) -> Result<(), WorkerError> {
    let Some(kind) = preamble(state, path, cfg.ignore_dot)? else {
        return Ok(());
    };
    if cfg.stat_only {
        return Ok(());
    }

    let (effective_kind, effective_path) = if kind == FileKind::Symlink {
        let raw_target = std::fs::read_link(path).map_err(|e| walk::FsError::from_io(path, e))?;
        state.stats.num_read_bytes += raw_target.as_os_str().len() as u64;

        let absolute = if raw_target.is_absolute() {
            raw_target
        } else {
            path.parent()
                .expect("a symlink always has a parent once made absolute")
                .join(raw_target)
        };
        let resolved_kind = classify_follow(&absolute)?;
        assert!(
            resolved_kind != FileKind::Symlink,
            "symlink chains must already be resolved: {}",
            absolute.display()
        );
        state.stats.num_stat += 1;

        if !cfg.follow_symlink {
            return Ok(());
        }
        (resolved_kind, absolute)
    } else {
        (kind, path.to_path_buf())
    };

    match effective_kind {
        FileKind::Dir | FileKind::Device | FileKind::Unsupported | FileKind::Symlink => Ok(()),
        FileKind::Reg => read_file(state, &effective_path, cfg.read_size),
        FileKind::Invalid => Err(WorkerError::InvalidKind(effective_path)),
    }
}

fn read_file(state: &mut WorkerState, path: &Path, read_size: i64) -> Result<(), WorkerError> {
    let mut file = std::fs::File::open(path).map_err(|e| walk::FsError::from_io(path, e))?;

    let buffer_len = state.read_buffer_mut().len();
    let mut resid: i64 = if read_size == 0 {
        rand::rng().random_range(1..=buffer_len as i64)
    } else {
        read_size
    };

    loop {
        let want = if resid < 0 {
            buffer_len
        } else {
            (resid as usize).min(buffer_len)
        };
        let n = {
            use std::io::Read;
            let buf = &mut state.read_buffer_mut()[..want];
            file.read(buf).map_err(|e| walk::FsError::from_io(path, e))?
        };
        state.stats.num_read += 1;
        state.stats.num_read_bytes += n as u64;

        if n == 0 {
            return Ok(());
        }
        if resid > 0 {
            resid -= n as i64;
            if resid <= 0 {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn default_cfg() -> ReadConfig {
        ReadConfig {
            ignore_dot: false,
            stat_only: false,
            follow_symlink: true,
            read_size: -1,
        }
    }

    #[test]
    fn stat_only_skips_body_read() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, b"hello").unwrap();

        let mut state = WorkerState::new_reader(0, 4096);
        let cfg = ReadConfig {
            stat_only: true,
            ..default_cfg()
        };
        read_entry(&mut state, &file, &cfg).unwrap();

        assert_eq!(state.stats.num_stat, 1);
        assert_eq!(state.stats.num_read, 0);
    }

    #[test]
    fn reads_regular_file_to_eof() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, vec![0u8; 10]).unwrap();

        let mut state = WorkerState::new_reader(0, 4);
        read_entry(&mut state, &file, &default_cfg()).unwrap();

        assert_eq!(state.stats.num_read_bytes, 10);
        assert!(state.stats.num_read >= 3);
    }

    #[test]
    fn dot_entry_skipped_when_ignore_dot_set() {
        let dir = tempdir().unwrap();
        let file = dir.path().join(".hidden");
        std::fs::write(&file, b"x").unwrap();

        let mut state = WorkerState::new_reader(0, 16);
        let cfg = ReadConfig {
            ignore_dot: true,
            ..default_cfg()
        };
        read_entry(&mut state, &file, &cfg).unwrap();

        assert_eq!(state.stats.num_stat, 1);
        assert_eq!(state.stats.num_read, 0);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_counts_target_length_and_follows() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, b"hello world").unwrap();
        let link = dir.path().join("lnk");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut state = WorkerState::new_reader(0, 4096);
        read_entry(&mut state, &link, &default_cfg()).unwrap();

        assert_eq!(state.stats.num_stat, 2);
        assert!(state.stats.num_read_bytes >= 11);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_not_followed_when_configured() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        std::fs::write(&target, b"hello world").unwrap();
        let link = dir.path().join("lnk");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut state = WorkerState::new_reader(0, 4096);
        let cfg = ReadConfig {
            follow_symlink: false,
            ..default_cfg()
        };
        read_entry(&mut state, &link, &cfg).unwrap();

        assert_eq!(state.stats.num_stat, 2);
        assert_eq!(state.stats.num_read, 0);
    }
}

use std::path::{Path, PathBuf};

use rand::Rng;
use walk::{CreateKind, FileKind, FsError, create, fsync};

use crate::WorkerError;
use crate::preamble::preamble;
use crate::state::WorkerState;

/// Knobs [`write_entry`] consults; stable across a whole run.
#[derive(Debug, Clone)]
pub struct WriteConfig {
    /// Basename component embedded in every created path (already
    /// normalized: a numeric raw value has already been expanded to that
    /// many copies of `x` by the caller).
    pub write_paths_base: String,
    /// Drop non-directory dot entries instead of writing to them.
    pub ignore_dot: bool,
    /// Run-scoped `YYYYMMDDHHMMSS` timestamp shared by every worker.
    pub ts: String,
    /// Kinds to sample uniformly from on each create; repetition biases the
    /// distribution (spec.md §9).
    pub write_paths_type: Vec<CreateKind>,
    /// Maximum registry size before a writer stops creating; `< 0` means
    /// unbounded.
    pub num_write_paths: i64,
    /// `-1` = no write / quota already handled by caller, `0` = draw a
    /// fresh uniform size per open, `>0` = exact residual to write.
    pub write_size: i64,
    /// Substitute a single `ftruncate` for the write loop.
    pub truncate_write_paths: bool,
    /// Fsync the created file (or directory) after creation/writing.
    pub fsync_write_paths: bool,
    /// Fsync the parent directory after creation.
    pub dirsync_write_paths: bool,
    /// Copy from a shared random-data bank instead of the `'A'`-filled
    /// write buffer.
    pub random_write_data: Option<RandomWriteData>,
}

/// A read-only, process-wide bank of printable-ASCII bytes writers copy
/// slices from when `random_write_data` is enabled.
#[derive(Debug, Clone)]
pub struct RandomWriteData {
    /// Shared bank, sized `2 * max_buffer_size`.
    pub bank: std::sync::Arc<Vec<u8>>,
}

/// Runs the write-entry state machine (spec.md §4.D.2) against `path`.
pub fn write_entry(state: &mut WorkerState, path: &Path, cfg: &WriteConfig) -> Result<(), WorkerError> {
    let Some(kind) = preamble(state, path, cfg.ignore_dot)? else {
        return Ok(());
    };

    match kind {
        FileKind::Dir => write_file(state, path, path, cfg),
        FileKind::Reg => {
            let parent = path
                .parent()
                .expect("a regular file always has a parent")
                .to_path_buf();
            write_file(state, &parent, path, cfg)
        }
        FileKind::Device | FileKind::Symlink | FileKind::Unsupported => Ok(()),
        FileKind::Invalid => Err(WorkerError::InvalidKind(path.to_path_buf())),
    }
}

fn write_file(
    state: &mut WorkerState,
    target_dir: &Path,
    old_path: &Path,
    cfg: &WriteConfig,
) -> Result<(), WorkerError> {
    if cfg.num_write_paths > 0 && (state.writer_mut().registry.len() as i64) >= cfg.num_write_paths {
        return Ok(());
    }

    let new_path = {
        let writer = state.writer_mut();
        let basename = format!(
            "dirload_{}_gid{}_{}_{}",
            cfg.write_paths_base, writer.writer_index, cfg.ts, writer.counter
        );
        writer.counter += 1;
        target_dir.join(basename)
    };

    let kind_idx = rand::rng().random_range(0..cfg.write_paths_type.len());
    let requested_kind = cfg.write_paths_type[kind_idx];
    let created_kind = create(old_path, &new_path, requested_kind)?;

    if cfg.fsync_write_paths {
        fsync(&new_path)?;
    }
    if cfg.dirsync_write_paths {
        fsync(target_dir)?;
    }

    state.writer_mut().registry.push(new_path.clone());

    if created_kind != FileKind::Reg {
        state.stats.num_write += 1;
        return Ok(());
    }

    write_regular_body(state, &new_path, cfg)
}

fn write_regular_body(state: &mut WorkerState, path: &Path, cfg: &WriteConfig) -> Result<(), WorkerError> {
    let mut resid: i64 = cfg.write_size;
    if resid < 0 {
        state.stats.num_write += 1;
        return Ok(());
    }
    let buffer_len = state.writer_mut().write_buffer.len();
    if resid == 0 {
        resid = rand::rng().random_range(1..=buffer_len as i64);
    }

    let file = std::fs::OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| FsError::from_io(path, e))?;

    if cfg.truncate_write_paths {
        file.set_len(resid as u64).map_err(|e| FsError::from_io(path, e))?;
        state.stats.num_write += 1;
    } else {
        write_loop(state, &file, path, resid, cfg)?;
    }

    if cfg.fsync_write_paths {
        file.sync_all().map_err(|e| FsError::from_io(path, e))?;
    }
    Ok(())
}

fn write_loop(
    state: &mut WorkerState,
    file: &std::fs::File,
    path: &Path,
    mut resid: i64,
    cfg: &WriteConfig,
) -> Result<(), WorkerError> {
    use std::io::Write;

    loop {
        let buffer_len = state.writer_mut().write_buffer.len();
        let want = (resid as usize).min(buffer_len);

        if let Some(random) = &cfg.random_write_data {
            let half = random.bank.len() / 2;
            let start = rand::rng().random_range(0..half.max(1));
            let src = &random.bank[start..start + want.min(random.bank.len() - start)];
            let writer = state.writer_mut();
            writer.write_buffer[..src.len()].copy_from_slice(src);
        }

        let n = {
            let writer = state.writer_mut();
            file.write(&writer.write_buffer[..want]).map_err(|e| FsError::from_io(path, e))?
        };
        state.stats.num_write += 1;
        state.stats.num_write_bytes += n as u64;
        resid -= n as i64;
        if resid <= 0 {
            return Ok(());
        }
    }
}

/// Convenience used by the dispatch core to build [`WriteConfig::write_paths_type`]
/// from the `d|r|s|l` alphabet string (spec.md §6).
pub fn parse_type_alphabet(s: &str) -> Vec<CreateKind> {
    s.chars()
        .filter_map(|c| match c {
            'd' => Some(CreateKind::Dir),
            'r' => Some(CreateKind::Reg),
            's' => Some(CreateKind::Symlink),
            'l' => Some(CreateKind::Link),
            _ => None,
        })
        .collect()
}

/// Normalizes `write_paths_base`: a value that parses as an integer `n` is
/// replaced by `n` copies of `'x'`.
#[must_use]
pub fn normalize_write_paths_base(raw: &str) -> String {
    match raw.parse::<usize>() {
        Ok(n) => "x".repeat(n),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn base_cfg(ts: &str) -> WriteConfig {
        WriteConfig {
            write_paths_base: "x".to_string(),
            ignore_dot: false,
            ts: ts.to_string(),
            write_paths_type: vec![CreateKind::Reg],
            num_write_paths: -1,
            write_size: 1024,
            truncate_write_paths: false,
            fsync_write_paths: false,
            dirsync_write_paths: false,
            random_write_data: None,
        }
    }

    #[test]
    fn write_regular_creates_file_of_requested_size() {
        let dir = tempdir().unwrap();
        let mut state = WorkerState::new_writer(1, 0, 4096);
        let cfg = base_cfg("20240101000000");

        write_entry(&mut state, dir.path(), &cfg).unwrap();

        assert_eq!(state.write_registry().len(), 1);
        let created = &state.write_registry()[0];
        assert_eq!(std::fs::metadata(created).unwrap().len(), 1024);
    }

    #[test]
    fn write_dir_creates_zero_byte_directory() {
        let dir = tempdir().unwrap();
        let mut state = WorkerState::new_writer(2, 0, 4096);
        let mut cfg = base_cfg("20240101000000");
        cfg.write_paths_type = vec![CreateKind::Dir];

        write_entry(&mut state, dir.path(), &cfg).unwrap();

        assert_eq!(state.stats.num_write, 1);
        let created = &state.write_registry()[0];
        assert!(std::fs::metadata(created).unwrap().is_dir());
    }

    #[test]
    fn quota_stops_writer_at_exact_size() {
        let dir = tempdir().unwrap();
        let mut state = WorkerState::new_writer(3, 0, 4096);
        let mut cfg = base_cfg("20240101000000");
        cfg.num_write_paths = 3;

        for _ in 0..10 {
            write_entry(&mut state, dir.path(), &cfg).unwrap();
        }

        assert_eq!(state.write_registry().len(), 3);
    }

    #[test]
    fn normalize_write_paths_base_expands_numeric() {
        assert_eq!(normalize_write_paths_base("3"), "xxx");
        assert_eq!(normalize_write_paths_base("abc"), "abc");
    }

    #[test]
    fn parse_type_alphabet_maps_letters() {
        let kinds = parse_type_alphabet("drr");
        assert_eq!(kinds, vec![CreateKind::Dir, CreateKind::Reg, CreateKind::Reg]);
    }

    #[test]
    fn fsync_write_paths_applies_to_a_created_symlink() {
        let dir = tempdir().unwrap();
        let mut state = WorkerState::new_writer(4, 0, 4096);
        let mut cfg = base_cfg("20240101000000");
        cfg.write_paths_type = vec![CreateKind::Symlink];
        cfg.fsync_write_paths = true;

        write_entry(&mut state, dir.path(), &cfg).unwrap();

        let created = &state.write_registry()[0];
        assert_eq!(walk::classify(created).unwrap(), FileKind::Symlink);
    }
}

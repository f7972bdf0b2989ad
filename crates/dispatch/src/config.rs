use std::path::PathBuf;

use walk::{CreateKind, classify};
use worker::{normalize_write_paths_base, parse_type_alphabet};

use crate::DispatchError;

/// How a worker selects the next path within its assigned flist, or
/// whether it walks the tree live instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIter {
    /// Lazy tree walk per iteration; no pre-built flist.
    Walk,
    /// Flist front-to-back.
    Ordered,
    /// Flist back-to-front.
    Reverse,
    /// Uniform sample of the flist, with replacement, per step.
    Random,
}

/// Maximum size accepted for any buffer or residual-size configuration
/// value, per spec.md §6.
pub const MAX_BUFFER_SIZE: usize = 128 * 1024;

/// The default writer quota (spec.md §6).
pub const DEFAULT_NUM_WRITE_PATHS: i64 = 1024;

/// A fully validated, immutable run configuration.
///
/// Built once by [`RunConfig::validate`] from raw CLI input; read-only for
/// the remainder of the run (spec.md §9's immutable-context design note).
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Absolute directory roots to operate on.
    pub roots: Vec<PathBuf>,
    /// Repeat the whole dispatch this many times.
    pub num_set: u32,
    /// Reader worker count.
    pub num_reader: usize,
    /// Writer worker count.
    pub num_writer: usize,
    /// Per-worker iteration cap; `<= 0` (after normalization, always `-1`)
    /// means unbounded.
    pub num_repeat: i64,
    /// Per-worker deadline in seconds; `0` disables.
    pub deadline_secs: u64,
    /// Monitor tick interval in seconds; `0` disables the monitor task.
    pub monitor_interval_secs: u64,
    /// Skip body reads/writes.
    pub stat_only: bool,
    /// Drop non-directory dot entries in both walk and flist modes.
    pub ignore_dot: bool,
    /// Whether a resolved symlink's target is read through.
    pub follow_symlink: bool,
    /// Size of each worker's read buffer.
    pub read_buffer_size: usize,
    /// Size of each worker's write buffer.
    pub write_buffer_size: usize,
    /// `-1` = EOF, `0` = random per open, `>0` = exact residual.
    pub read_size: i64,
    /// `-1` = no body write, `0` = random per open, `>0` = exact residual.
    pub write_size: i64,
    /// Populate the printable-ASCII bank and copy from it on every write.
    pub random_write_data: bool,
    /// Writer quota; `< 0` means unbounded.
    pub num_write_paths: i64,
    /// Substitute `ftruncate` for the write loop.
    pub truncate_write_paths: bool,
    /// Fsync each created path after writing.
    pub fsync_write_paths: bool,
    /// Fsync each created path's parent directory.
    pub dirsync_write_paths: bool,
    /// Skip cleanup; report the created-path count as "remaining" instead.
    pub keep_write_paths: bool,
    /// One-shot: unlink existing `dirload_<base>_*` entries and exit.
    pub clean_write_paths: bool,
    /// Normalized basename component (numeric raw values already expanded).
    pub write_paths_base: String,
    /// Kind alphabet sampled uniformly on each create.
    pub write_paths_type: Vec<CreateKind>,
    /// Path iteration strategy.
    pub path_iter: PathIter,
    /// Optional pre-recorded flist file.
    pub flist_file: Option<PathBuf>,
    /// One-shot: emit the flist for the roots and exit.
    pub flist_file_create: bool,
    /// Bypass the "root must contain >= 3 separators" safety.
    pub force: bool,
}

/// Raw, unvalidated input mirroring the CLI surface (spec.md §6). Every
/// field here corresponds 1:1 to a flag; [`RunConfig::validate`] is the only
/// place defaults are applied and normalization happens.
#[derive(Debug, Clone)]
pub struct RawConfig {
    /// See [`RunConfig::roots`].
    pub roots: Vec<PathBuf>,
    /// See [`RunConfig::num_set`].
    pub num_set: u32,
    /// See [`RunConfig::num_reader`].
    pub num_reader: usize,
    /// See [`RunConfig::num_writer`].
    pub num_writer: usize,
    /// Raw `num_repeat`, pre-normalization.
    pub num_repeat: i64,
    /// Raw `time_minute`.
    pub time_minute: u64,
    /// Raw `time_second`.
    pub time_second: u64,
    /// Raw `monitor_interval_minute`.
    pub monitor_interval_minute: u64,
    /// Raw `monitor_interval_second`.
    pub monitor_interval_second: u64,
    /// See [`RunConfig::stat_only`].
    pub stat_only: bool,
    /// See [`RunConfig::ignore_dot`].
    pub ignore_dot: bool,
    /// See [`RunConfig::follow_symlink`].
    pub follow_symlink: bool,
    /// See [`RunConfig::read_buffer_size`].
    pub read_buffer_size: usize,
    /// See [`RunConfig::write_buffer_size`].
    pub write_buffer_size: usize,
    /// See [`RunConfig::read_size`].
    pub read_size: i64,
    /// See [`RunConfig::write_size`].
    pub write_size: i64,
    /// See [`RunConfig::random_write_data`].
    pub random_write_data: bool,
    /// Raw `num_write_paths`, pre-normalization.
    pub num_write_paths: i64,
    /// See [`RunConfig::truncate_write_paths`].
    pub truncate_write_paths: bool,
    /// See [`RunConfig::fsync_write_paths`].
    pub fsync_write_paths: bool,
    /// See [`RunConfig::dirsync_write_paths`].
    pub dirsync_write_paths: bool,
    /// See [`RunConfig::keep_write_paths`].
    pub keep_write_paths: bool,
    /// See [`RunConfig::clean_write_paths`].
    pub clean_write_paths: bool,
    /// Raw `write_paths_base`, pre-normalization.
    pub write_paths_base: String,
    /// Raw `write_paths_type` alphabet string.
    pub write_paths_type: String,
    /// Raw `path_iter` selector.
    pub path_iter: PathIter,
    /// See [`RunConfig::flist_file`].
    pub flist_file: Option<PathBuf>,
    /// See [`RunConfig::flist_file_create`].
    pub flist_file_create: bool,
    /// See [`RunConfig::force`].
    pub force: bool,
}

impl RunConfig {
    /// Validates and normalizes `raw`, per spec.md §6 and §4.E step 1-4.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Configuration`] on any rejected value: empty
    /// root list, a root that is not a directory, a root too close to `/`
    /// without `force`, an out-of-range buffer/residual size, an empty
    /// `write_paths_base`/`write_paths_type`, or an unrecognized type-letter.
    pub fn validate(raw: RawConfig) -> Result<Self, DispatchError> {
        if raw.roots.is_empty() {
            return Err(DispatchError::Configuration("at least one root is required".into()));
        }
        for root in &raw.roots {
            validate_root(root, raw.force)?;
        }

        if raw.read_buffer_size == 0 || raw.read_buffer_size > MAX_BUFFER_SIZE {
            return Err(DispatchError::Configuration(format!(
                "read_buffer_size must be in 1..={MAX_BUFFER_SIZE}"
            )));
        }
        if raw.write_buffer_size == 0 || raw.write_buffer_size > MAX_BUFFER_SIZE {
            return Err(DispatchError::Configuration(format!(
                "write_buffer_size must be in 1..={MAX_BUFFER_SIZE}"
            )));
        }
        if raw.read_size > MAX_BUFFER_SIZE as i64 {
            return Err(DispatchError::Configuration(format!("read_size must be <= {MAX_BUFFER_SIZE}")));
        }
        if raw.write_size > MAX_BUFFER_SIZE as i64 {
            return Err(DispatchError::Configuration(format!("write_size must be <= {MAX_BUFFER_SIZE}")));
        }

        if raw.write_paths_base.is_empty() {
            return Err(DispatchError::Configuration("write_paths_base must not be empty".into()));
        }
        if raw.write_paths_type.is_empty() {
            return Err(DispatchError::Configuration("write_paths_type must not be empty".into()));
        }
        let write_paths_type = parse_type_alphabet(&raw.write_paths_type);
        if write_paths_type.len() != raw.write_paths_type.chars().count() {
            return Err(DispatchError::Configuration(format!(
                "write_paths_type contains a letter outside d|r|s|l: {}",
                raw.write_paths_type
            )));
        }

        let num_repeat = if raw.num_repeat <= 0 { -1 } else { raw.num_repeat };
        let num_write_paths = if raw.num_write_paths < 0 { -1 } else { raw.num_write_paths };

        let mut path_iter = raw.path_iter;
        if path_iter == PathIter::Walk && raw.flist_file.is_some() {
            path_iter = PathIter::Ordered;
        }

        Ok(Self {
            roots: raw.roots,
            num_set: raw.num_set.max(1),
            num_reader: raw.num_reader,
            num_writer: raw.num_writer,
            num_repeat,
            deadline_secs: raw.time_minute * 60 + raw.time_second,
            monitor_interval_secs: raw.monitor_interval_minute * 60 + raw.monitor_interval_second,
            stat_only: raw.stat_only,
            ignore_dot: raw.ignore_dot,
            follow_symlink: raw.follow_symlink,
            read_buffer_size: raw.read_buffer_size,
            write_buffer_size: raw.write_buffer_size,
            read_size: raw.read_size,
            write_size: raw.write_size,
            random_write_data: raw.random_write_data,
            num_write_paths,
            truncate_write_paths: raw.truncate_write_paths,
            fsync_write_paths: raw.fsync_write_paths,
            dirsync_write_paths: raw.dirsync_write_paths,
            keep_write_paths: raw.keep_write_paths,
            clean_write_paths: raw.clean_write_paths,
            write_paths_base: normalize_write_paths_base(&raw.write_paths_base),
            write_paths_type,
            path_iter,
            flist_file: raw.flist_file,
            flist_file_create: raw.flist_file_create,
            force: raw.force,
        })
    }
}

/// Crude proxy for "not too close to `/`": a root must contain at least
/// three separator characters unless `force` is set (spec.md §9, preserved
/// as-is: the exact threshold is load-bearing, not a rounding choice).
const MIN_ROOT_SEPARATORS: usize = 3;

fn validate_root(root: &std::path::Path, force: bool) -> Result<(), DispatchError> {
    if !root.is_absolute() {
        return Err(DispatchError::Configuration(format!("root must be absolute: {}", root.display())));
    }
    match classify(root) {
        Ok(walk::FileKind::Dir) => {}
        Ok(_) => return Err(DispatchError::Configuration(format!("root is not a directory: {}", root.display()))),
        Err(e) => return Err(DispatchError::Configuration(format!("root: {e}"))),
    }
    let separators = root.to_string_lossy().matches('/').count();
    if !force && separators < MIN_ROOT_SEPARATORS {
        return Err(DispatchError::Configuration(format!(
            "root {} is too close to / (use --force to override)",
            root.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_raw(root: PathBuf) -> RawConfig {
        RawConfig {
            roots: vec![root],
            num_set: 1,
            num_reader: 1,
            num_writer: 0,
            num_repeat: -1,
            time_minute: 0,
            time_second: 0,
            monitor_interval_minute: 0,
            monitor_interval_second: 0,
            stat_only: false,
            ignore_dot: false,
            follow_symlink: false,
            read_buffer_size: 65536,
            write_buffer_size: 65536,
            read_size: -1,
            write_size: -1,
            random_write_data: false,
            num_write_paths: DEFAULT_NUM_WRITE_PATHS,
            truncate_write_paths: false,
            fsync_write_paths: false,
            dirsync_write_paths: false,
            keep_write_paths: false,
            clean_write_paths: false,
            write_paths_base: "x".into(),
            write_paths_type: "dr".into(),
            path_iter: PathIter::Ordered,
            flist_file: None,
            flist_file_create: false,
            force: true,
        }
    }

    #[test]
    fn rejects_empty_roots() {
        let raw = minimal_raw(PathBuf::from("/tmp"));
        let mut raw = raw;
        raw.roots.clear();
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn normalizes_num_repeat_non_positive_to_unbounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = minimal_raw(dir.path().to_path_buf());
        raw.num_repeat = 0;
        let cfg = RunConfig::validate(raw).unwrap();
        assert_eq!(cfg.num_repeat, -1);
    }

    #[test]
    fn walk_with_flist_file_downgrades_to_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = minimal_raw(dir.path().to_path_buf());
        raw.path_iter = PathIter::Walk;
        raw.flist_file = Some(dir.path().join("flist.txt"));
        let cfg = RunConfig::validate(raw).unwrap();
        assert_eq!(cfg.path_iter, PathIter::Ordered);
    }

    #[test]
    fn rejects_oversized_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = minimal_raw(dir.path().to_path_buf());
        raw.read_buffer_size = MAX_BUFFER_SIZE + 1;
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn rejects_unrecognized_type_letter() {
        let dir = tempfile::tempdir().unwrap();
        let mut raw = minimal_raw(dir.path().to_path_buf());
        raw.write_paths_type = "dz".into();
        assert!(RunConfig::validate(raw).is_err());
    }

    #[test]
    fn root_close_to_slash_rejected_without_force() {
        let mut raw = minimal_raw(PathBuf::from("/tmp"));
        raw.force = false;
        assert!(RunConfig::validate(raw).is_err());
    }
}

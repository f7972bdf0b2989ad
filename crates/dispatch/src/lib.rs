#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `dispatch` is the worker supervisor: it turns a validated [`RunConfig`]
//! into a running pool of reader/writer threads, probes cancellation and
//! per-worker deadlines between every entry, optionally runs a periodic
//! monitor, and reclaims every path a writer created once the pool winds
//! down.
//!
//! # Design
//!
//! [`dispatch_all`] is the only entry point the `cli` crate calls. It drives
//! the `num_set` outer loop (spec.md §4.E step 0): each iteration builds a
//! fresh [`RunContext`], runs [`supervisor::dispatch_once`], and prints the
//! iteration's stats table before moving to the next set or stopping early
//! on SIGINT. A set boundary is the only place `dirload` pauses between
//! dispatches; there is no delay between consecutive sets.
//!
//! # Errors
//!
//! [`DispatchError`] covers configuration rejection, flist construction
//! failures, signal installation failures, and the bookkeeping errors the
//! supervisor surfaces (worker panics, reclaim against an unexpected file
//! kind).

mod cleanup;
mod config;
mod context;
mod error;
mod signal;
mod supervisor;

use std::sync::Arc;

use logging::DebugSink;

pub use cleanup::{collect_existing, reclaim};
pub use config::{DEFAULT_NUM_WRITE_PATHS, MAX_BUFFER_SIZE, PathIter, RawConfig, RunConfig};
pub use context::RunContext;
pub use error::DispatchError;
pub use signal::is_cancelled;
pub use supervisor::{DispatchOutcome, run_clean_write_paths, run_flist_file_create};

/// Result of a whole run: one [`DispatchOutcome`] per completed set, in
/// order. Shorter than `cfg.num_set` only if SIGINT cut the run short.
pub type RunOutcome = Vec<DispatchOutcome>;

/// Runs `cfg.num_set` dispatches back to back, rendering each one's stats
/// table through `sink` and stopping early if a dispatch was interrupted.
///
/// This is the sole entry point the `cli` crate calls after validating its
/// raw input into a [`RunConfig`].
///
/// # Errors
///
/// Returns [`DispatchError`] on the first dispatch that fails; prior
/// completed sets are not rolled back.
pub fn dispatch_all(cfg: &RunConfig, sink: Arc<dyn DebugSink>) -> Result<RunOutcome, DispatchError> {
    let mut outcomes = Vec::with_capacity(cfg.num_set as usize);

    for set in 0..cfg.num_set {
        if cfg.num_set > 1 {
            sink.line(&format!("=== set {} of {} ===", set + 1, cfg.num_set));
        }

        let outcome = supervisor::dispatch_once(cfg, Arc::clone(&sink))?;
        let rendered = stats::render(&outcome.rows);
        if !rendered.is_empty() {
            sink.line(&rendered);
        }

        let interrupted = outcome.num_interrupted > 0;
        outcomes.push(outcome);
        if interrupted {
            break;
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::NullSink;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn minimal_cfg(roots: Vec<PathBuf>, num_set: u32) -> RunConfig {
        RunConfig::validate(RawConfig {
            roots,
            num_set,
            num_reader: 1,
            num_writer: 0,
            num_repeat: 1,
            time_minute: 0,
            time_second: 0,
            monitor_interval_minute: 0,
            monitor_interval_second: 0,
            stat_only: true,
            ignore_dot: false,
            follow_symlink: false,
            read_buffer_size: 4096,
            write_buffer_size: 4096,
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
            path_iter: PathIter::Walk,
            flist_file: None,
            flist_file_create: false,
            force: true,
        })
        .unwrap()
    }

    #[test]
    fn dispatch_all_runs_num_set_iterations() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a"), b"x").unwrap();
        let cfg = minimal_cfg(vec![dir.path().to_path_buf()], 3);

        let outcomes = dispatch_all(&cfg, Arc::new(NullSink)).unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes.iter().all(|o| o.num_complete == 1));
    }
}

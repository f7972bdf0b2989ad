use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use worker::{WorkerRole, WorkerStats};

use crate::Row;

/// A monitor-visible mirror of one worker's counters.
///
/// The monitor task (spec.md §4.E phase 7) is explicitly advisory and races
/// with the worker it watches; in Go that race is merely "tolerated" by
/// reading shared slices directly. Rust requires synchronized access even
/// for an advisory read, so each counter here is an [`AtomicU64`] the
/// supervisor stores into (not adds to — it always holds the worker's
/// authoritative running total) after every entry the worker processes.
#[derive(Debug)]
pub struct Live {
    role: WorkerRole,
    input_root: PathBuf,
    begin: Instant,
    end: Mutex<Option<Instant>>,
    num_repeat: AtomicU64,
    num_stat: AtomicU64,
    num_read: AtomicU64,
    num_read_bytes: AtomicU64,
    num_write: AtomicU64,
    num_write_bytes: AtomicU64,
}

impl Live {
    /// Creates a fresh mirror for a worker about to start its loop.
    #[must_use]
    pub fn new(role: WorkerRole, input_root: PathBuf) -> Self {
        Self {
            role,
            input_root,
            begin: Instant::now(),
            end: Mutex::new(None),
            num_repeat: AtomicU64::new(0),
            num_stat: AtomicU64::new(0),
            num_read: AtomicU64::new(0),
            num_read_bytes: AtomicU64::new(0),
            num_write: AtomicU64::new(0),
            num_write_bytes: AtomicU64::new(0),
        }
    }

    /// Overwrites every counter with the worker's current authoritative
    /// values. Called by the worker itself after each entry it processes,
    /// only when a monitor is running.
    pub fn sync(&self, stats: &WorkerStats) {
        self.num_repeat.store(stats.num_repeat, Ordering::Relaxed);
        self.num_stat.store(stats.num_stat, Ordering::Relaxed);
        self.num_read.store(stats.num_read, Ordering::Relaxed);
        self.num_read_bytes.store(stats.num_read_bytes, Ordering::Relaxed);
        self.num_write.store(stats.num_write, Ordering::Relaxed);
        self.num_write_bytes.store(stats.num_write_bytes, Ordering::Relaxed);
    }

    /// Marks this worker as finished, fixing its end time for future
    /// snapshots. Idempotent.
    pub fn finish(&self) {
        let mut end = self.end.lock().expect("monitor mutex poisoned");
        if end.is_none() {
            *end = Some(Instant::now());
        }
    }

    /// Renders a [`Row`] as of right now. For a still-running worker, the
    /// elapsed time is computed against the current instant rather than a
    /// real `time_end` (spec.md §4.E phase 7: "closing `timeEnd` for
    /// still-running workers only" in the snapshot, not in the worker's own
    /// state).
    #[must_use]
    pub fn snapshot(&self) -> Row {
        let end = self.end.lock().expect("monitor mutex poisoned").unwrap_or_else(Instant::now);
        Row {
            role: self.role,
            stats: WorkerStats {
                input_root: self.input_root.clone(),
                time_begin: Some(self.begin),
                time_end: Some(end),
                num_repeat: self.num_repeat.load(Ordering::Relaxed),
                num_stat: self.num_stat.load(Ordering::Relaxed),
                num_read: self.num_read.load(Ordering::Relaxed),
                num_read_bytes: self.num_read_bytes.load(Ordering::Relaxed),
                num_write: self.num_write.load(Ordering::Relaxed),
                num_write_bytes: self.num_write_bytes.load(Ordering::Relaxed),
                num_complete: 0,
                num_interrupted: 0,
                num_error: 0,
            },
        }
    }
}

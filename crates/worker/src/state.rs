use std::path::PathBuf;
use std::time::Instant;

/// Which side of the pool a worker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerRole {
    /// Drives [`crate::read_entry`].
    Reader,
    /// Drives [`crate::write_entry`].
    Writer,
}

/// Byte used to pre-fill every writer's write buffer.
pub const WRITE_BUFFER_FILL: u8 = b'A';

/// Per-worker counters, surfaced to the stats reporter after join.
///
/// Exactly one of `num_complete`, `num_interrupted`, `num_error` is
/// ultimately incremented (spec.md P3).
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    /// The root this worker was assigned (set once at spawn).
    pub input_root: PathBuf,
    /// Wall-clock instant the worker started its loop.
    pub time_begin: Option<Instant>,
    /// Wall-clock instant the worker's loop exited.
    pub time_end: Option<Instant>,
    /// Full root iterations completed.
    pub num_repeat: u64,
    /// Entries classified (`stat`).
    pub num_stat: u64,
    /// Read syscalls issued.
    pub num_read: u64,
    /// Bytes returned by reads, plus symlink target string lengths.
    pub num_read_bytes: u64,
    /// Write syscalls issued (or write-equivalent creations).
    pub num_write: u64,
    /// Bytes returned by writes.
    pub num_write_bytes: u64,
    /// Set when the worker ran to natural or timer completion.
    pub num_complete: u64,
    /// Set when the worker was cancelled by the interrupt broadcast.
    pub num_interrupted: u64,
    /// Set when the worker exited on an unrecoverable error.
    pub num_error: u64,
}

impl WorkerStats {
    /// Seconds elapsed between `time_begin` and `time_end`.
    ///
    /// Returns `0.0` if either endpoint is unset.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        match (self.time_begin, self.time_end) {
            (Some(begin), Some(end)) => end.saturating_duration_since(begin).as_secs_f64(),
            _ => 0.0,
        }
    }
}

/// Writer-only state: zero-cost absence on readers (spec.md §4.B).
#[derive(Debug)]
pub struct WriterState {
    /// Pre-filled with [`WRITE_BUFFER_FILL`].
    pub write_buffer: Vec<u8>,
    /// Paths created by this writer, in creation order (spec.md P2).
    pub registry: Vec<PathBuf>,
    /// Monotonically increasing, embedded in each created basename.
    pub counter: u64,
    /// `gid - num_reader`, used in filenames and write-type arrays.
    pub writer_index: usize,
}

/// The state owned exclusively by one worker task for its whole lifetime.
#[derive(Debug)]
pub struct WorkerState {
    id: usize,
    role: WorkerRole,
    read_buffer: Option<Vec<u8>>,
    writer: Option<WriterState>,
    /// Counters and timing for this worker.
    pub stats: WorkerStats,
}

impl WorkerState {
    /// Constructs a reader: allocates only the read buffer.
    #[must_use]
    pub fn new_reader(id: usize, read_buffer_size: usize) -> Self {
        Self {
            id,
            role: WorkerRole::Reader,
            read_buffer: Some(vec![0u8; read_buffer_size]),
            writer: None,
            stats: WorkerStats::default(),
        }
    }

    /// Constructs a writer: allocates only the write buffer, pre-filled.
    #[must_use]
    pub fn new_writer(id: usize, writer_index: usize, write_buffer_size: usize) -> Self {
        Self {
            id,
            role: WorkerRole::Writer,
            read_buffer: None,
            writer: Some(WriterState {
                write_buffer: vec![WRITE_BUFFER_FILL; write_buffer_size],
                registry: Vec::new(),
                counter: 0,
                writer_index,
            }),
            stats: WorkerStats::default(),
        }
    }

    /// This worker's stable id (`gid`).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// `Reader` or `Writer`.
    #[must_use]
    pub fn role(&self) -> WorkerRole {
        self.role
    }

    pub(crate) fn read_buffer_mut(&mut self) -> &mut Vec<u8> {
        self.read_buffer
            .as_mut()
            .expect("read_entry invoked on a worker with no read buffer")
    }

    pub(crate) fn writer_mut(&mut self) -> &mut WriterState {
        self.writer
            .as_mut()
            .expect("write_entry invoked on a worker with no writer state")
    }

    /// The paths this worker has created so far, read-only view.
    #[must_use]
    pub fn write_registry(&self) -> &[PathBuf] {
        self.writer.as_ref().map_or(&[], |w| w.registry.as_slice())
    }

    /// Consumes this worker, returning its created-path registry for the
    /// supervisor's post-join merge. Empty for readers.
    #[must_use]
    pub fn into_write_registry(self) -> Vec<PathBuf> {
        self.writer.map(|w| w.registry).unwrap_or_default()
    }
}

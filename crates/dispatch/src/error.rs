use std::path::PathBuf;

/// Errors surfaced by configuration validation and the dispatch supervisor.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A configuration value failed validation before any worker spawned.
    #[error("{0}")]
    Configuration(String),
    /// Building a flist (or loading/writing one) failed.
    #[error(transparent)]
    Flist(#[from] flist::FlistError),
    /// A filesystem primitive failed outside of a worker's own loop (root
    /// validation, reclaim).
    #[error(transparent)]
    Fs(#[from] walk::FsError),
    /// A worker's entry operation failed in a way the supervisor must
    /// surface rather than just count as `numError`.
    #[error(transparent)]
    Worker(#[from] worker::WorkerError),
    /// After cleanup, one or more registered write paths could not be
    /// reclaimed.
    #[error("{0} write path(s) remain after cleanup")]
    ResidualWritePaths(usize),
    /// Installing the SIGINT handler failed.
    #[error("failed to install signal handler: {0}")]
    SignalSetup(#[from] ctrlc::Error),
    /// A worker thread panicked instead of returning.
    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
    /// `clean_write_paths` or `flist_file_create` failed against a specific
    /// path.
    #[error("{path}: {source}")]
    Io {
        /// The offending path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

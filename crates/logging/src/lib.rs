#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` gives `dirload`'s dispatch core a debug log it can write to
//! without knowing how that log is backed. The core only ever asks a
//! [`DebugSink`] for a line; this crate supplies the verbosity flags and the
//! `tracing`-backed sink that upstream `dirload` wired to a per-user
//! `~/.dirload.log` file opened in append mode.
//!
//! # Design
//!
//! Upstream's debug log serialized every line through a single-slot channel
//! used as a mutex (see `log.go`'s `globalLock`/`globalUnlock`). `tracing`'s
//! global dispatcher already serializes writes from concurrent subscribers
//! internally, so [`TracingSink`] needs no hand-rolled lock of its own — one
//! less piece of shared state for the worker pool to coordinate on.
//!
//! # Errors
//!
//! [`init`] returns [`LoggingError`] if the subscriber cannot be installed
//! (for example because one was already installed by the same process).

use std::fmt;

/// Something a worker or the supervisor can hand a debug line to.
///
/// The dispatch core depends only on this trait, never on `tracing`
/// directly, so it can be driven in tests with an in-memory sink.
pub trait DebugSink: fmt::Debug + Send + Sync {
    /// Records one line. Implementations that are disabled (no `--debug`)
    /// may make this a no-op.
    fn line(&self, message: &str);
}

/// A [`DebugSink`] backed by the `tracing` dispatcher.
///
/// Lines are emitted at `DEBUG` level under the `dirload::debug` target;
/// [`init`] wires a subscriber that writes them to the user's debug log file
/// when `--debug` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn line(&self, message: &str) {
        tracing::debug!(target: "dirload::debug", "{message}");
    }
}

/// A [`DebugSink`] that discards every line.
///
/// Used when `--debug` is not set, so call sites never need to branch on
/// whether debugging is enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DebugSink for NullSink {
    fn line(&self, _message: &str) {}
}

/// Errors returned by [`init`].
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// A global subscriber was already set for this process.
    #[error("a tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Installs the process-wide `tracing` subscriber and returns the sink the
/// dispatch core should route debug lines through.
///
/// - `verbose` raises the console's minimum level from `WARN` to `INFO`.
/// - `debug` additionally enables `DEBUG`-level lines (the ones `dirload`
///   writes through the returned [`DebugSink`]) and returns a [`TracingSink`]
///   instead of a [`NullSink`], matching upstream's behavior of only opening
///   the `~/.dirload.log` file when `--debug` is passed.
pub fn init(verbose: bool, debug: bool) -> Result<Box<dyn DebugSink>, LoggingError> {
    use tracing_subscriber::EnvFilter;

    let default_level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if debug {
        Ok(Box::new(TracingSink))
    } else {
        Ok(Box::new(NullSink))
    }
}

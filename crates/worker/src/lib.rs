#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `worker` owns the per-worker state (`dirload`'s component B) and the two
//! per-entry state machines that drive it, [`read_entry`] and
//! [`write_entry`] (component D). Everything above this crate — root
//! assignment, path iteration, cancellation, timers — belongs to the
//! dispatch supervisor; this crate only knows how to classify, read, and
//! write one path at a time.
//!
//! # Design
//!
//! [`WorkerState`] mirrors upstream `dirload`'s per-goroutine globals
//! (`stat.go`'s parallel slices) but packaged as a struct the dispatch core
//! moves into and out of a worker task, never sharing it mutably across
//! threads. Readers allocate only a read buffer; writers allocate only a
//! write buffer plus a registry and counter, matching spec.md §4.B exactly.
//!
//! # Errors
//!
//! Both state machines return [`WorkerError`] for genuine failures. Sentinel
//! interrupt/deadline unwinding is the dispatch core's concern, modeled
//! there, not here.

mod error;
mod preamble;
mod read_entry;
mod state;
mod write_entry;

pub use error::WorkerError;
pub use read_entry::{ReadConfig, read_entry};
pub use state::{WRITE_BUFFER_FILL, WorkerRole, WorkerState, WorkerStats, WriterState};
pub use write_entry::{
    RandomWriteData, WriteConfig, normalize_write_paths_base, parse_type_alphabet, write_entry,
};

use std::sync::Arc;

use rand::Rng;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::config::{MAX_BUFFER_SIZE, RunConfig};

/// Process-wide state built once at supervisor entry and read-only for the
/// rest of the run (spec.md §9's immutable-context design note).
///
/// A fresh run is a fresh `RunContext`; nothing here is ever reset in place.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// `YYYYMMDDHHMMSS`, embedded in every write path this run creates.
    pub ts: String,
    /// Printable-ASCII bank writers copy slices from, present only when
    /// `random_write_data` is enabled. Sized `2 * MAX_BUFFER_SIZE`.
    pub random_write_data: Option<Arc<Vec<u8>>>,
}

impl RunContext {
    /// Builds a new context for one dispatch (one `num_set` iteration).
    #[must_use]
    pub fn new(cfg: &RunConfig) -> Self {
        Self {
            ts: format_timestamp(OffsetDateTime::now_utc()),
            random_write_data: cfg.random_write_data.then(fill_random_bank),
        }
    }
}

fn format_timestamp(now: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day][hour][minute][second]");
    now.format(&format).expect("fixed-width timestamp format never fails")
}

fn fill_random_bank() -> Arc<Vec<u8>> {
    let mut bank = vec![0u8; 2 * MAX_BUFFER_SIZE];
    rand::rng().fill(bank.as_mut_slice());
    for b in &mut bank {
        *b = 32 + (*b % (126 - 32 + 1));
    }
    Arc::new(bank)
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crossbeam_channel::{Receiver, Sender, TryRecvError};

/// One-shot cancellation broadcast: every worker, the monitor, and the
/// signal machinery observe the same receiver. Closing the sole retained
/// [`Sender`] (by dropping it) is the "broadcast" — every clone of the
/// receiver then sees every future `try_recv` as disconnected.
pub struct Interrupt {
    tx: Option<Sender<()>>,
    rx: Receiver<()>,
}

impl Interrupt {
    /// Creates a fresh, open broadcast.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::bounded(0);
        Self { tx: Some(tx), rx }
    }

    /// A receiver clone for a worker or auxiliary task to probe.
    #[must_use]
    pub fn receiver(&self) -> Receiver<()> {
        self.rx.clone()
    }

    /// Closes the broadcast: every outstanding receiver now observes
    /// cancellation on its next probe.
    pub fn close(&mut self) {
        self.tx.take();
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking cancellation probe (spec.md §5's "the only cancellation
/// probe"). Returns `true` once the broadcast has been closed.
#[must_use]
pub fn is_cancelled(rx: &Receiver<()>) -> bool {
    matches!(rx.try_recv(), Err(TryRecvError::Disconnected))
}

/// The completion signal: workers and the signal handler post to it at most
/// once; the supervisor blocks on it to learn "stop waiting, either every
/// worker finished or SIGINT arrived".
pub type CompletionSignal = Sender<()>;

static SIGNALED: AtomicBool = AtomicBool::new(false);
static CURRENT_COMPLETION: OnceLock<Mutex<Option<CompletionSignal>>> = OnceLock::new();
static HANDLER_INSTALLED: OnceLock<()> = OnceLock::new();

fn completion_slot() -> &'static Mutex<Option<CompletionSignal>> {
    CURRENT_COMPLETION.get_or_init(|| Mutex::new(None))
}

/// Installs the process-wide SIGINT handler exactly once.
///
/// `ctrlc` only allows a single handler per process, but spec.md's "signal
/// task" is logically scoped to one dispatch (one `num_set` iteration).
/// [`arm`]/[`disarm`] bridge that gap: the handler always posts to whatever
/// completion sender is currently armed, so each dispatch iteration installs
/// its own sender without re-registering with the OS.
///
/// # Errors
///
/// Propagates [`ctrlc::Error`] if the OS handler cannot be installed.
pub fn install() -> Result<(), ctrlc::Error> {
    if HANDLER_INSTALLED.get().is_some() {
        return Ok(());
    }
    ctrlc::set_handler(|| {
        SIGNALED.store(true, Ordering::SeqCst);
        if let Some(tx) = completion_slot().lock().unwrap().as_ref() {
            let _ = tx.try_send(());
        }
    })?;
    let _ = HANDLER_INSTALLED.set(());
    Ok(())
}

/// Arms the handler for one dispatch iteration with `tx`, and clears the
/// "signaled" flag from any prior iteration.
pub fn arm(tx: CompletionSignal) {
    SIGNALED.store(false, Ordering::SeqCst);
    *completion_slot().lock().unwrap() = Some(tx);
}

/// Disarms the handler after a dispatch iteration has joined.
pub fn disarm() {
    *completion_slot().lock().unwrap() = None;
}

/// Whether SIGINT has fired since the most recent [`arm`].
#[must_use]
pub fn was_signaled() -> bool {
    SIGNALED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_reports_cancelled_only_after_close() {
        let mut interrupt = Interrupt::new();
        let rx = interrupt.receiver();
        assert!(!is_cancelled(&rx));
        interrupt.close();
        assert!(is_cancelled(&rx));
    }

    #[test]
    fn arm_resets_signaled_flag() {
        let (tx, _rx) = crossbeam_channel::bounded(1);
        SIGNALED.store(true, Ordering::SeqCst);
        arm(tx);
        assert!(!was_signaled());
        disarm();
    }
}

//! Signal handling for interrupting a watch (SIGINT/SIGTERM)
//!
//! On the first signal the shared [`CancelToken`] is tripped; the watcher
//! wakes from its sleep and returns `Cancelled`. On a second signal the
//! process exits immediately with [`EXIT_CODE_CANCELLED`].

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::cancel::CancelToken;
use crate::watcher::EXIT_CODE_CANCELLED;

/// Action to take after receiving a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// First signal: cancel the watch
    InitiateCancellation,
    /// Second signal: exit now
    ImmediateExit,
    /// Third+ signal: ignore
    Ignore,
}

/// Signal bookkeeping shared with the handler thread
#[derive(Debug, Default)]
pub struct SignalState {
    signal_count: AtomicU8,
    cancel: CancelToken,
}

impl SignalState {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            signal_count: AtomicU8::new(0),
            cancel,
        }
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Record one signal and decide what to do about it
    pub fn handle_signal(&self) -> SignalAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        match count {
            0 => {
                self.cancel.cancel();
                SignalAction::InitiateCancellation
            }
            1 => SignalAction::ImmediateExit,
            _ => SignalAction::Ignore,
        }
    }
}

/// Installs the process-wide ctrl-c handler
pub struct SignalHandler {
    state: Arc<SignalState>,
}

impl SignalHandler {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            state: Arc::new(SignalState::new(cancel)),
        }
    }

    pub fn state(&self) -> Arc<SignalState> {
        Arc::clone(&self.state)
    }

    /// Install the handler. Must be called at most once per process.
    pub fn install(&self) -> Result<(), ctrlc::Error> {
        let state = Arc::clone(&self.state);
        ctrlc::set_handler(move || match state.handle_signal() {
            SignalAction::InitiateCancellation => {
                tracing::warn!("interrupt received, stopping watch (press ctrl-c again to exit now)");
            }
            SignalAction::ImmediateExit => {
                eprintln!("\nReceived second interrupt, exiting immediately...");
                std::process::exit(EXIT_CODE_CANCELLED);
            }
            SignalAction::Ignore => {}
        })
    }
}

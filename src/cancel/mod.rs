//! Cancellation support for a running watch
//!
//! A [`CancelToken`] is shared between the watcher and whoever may stop it
//! (the ctrl-c handler, a supervising thread, a test). Sleeping between polls
//! goes through a [`Sleeper`] so the wait can end as soon as the token trips.

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct TokenState {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

/// Shared cancellation flag with wake-up
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter
    pub fn cancel(&self) {
        let mut cancelled = self
            .state
            .cancelled
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *cancelled = true;
        self.state.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state
            .cancelled
            .lock()
            .map(|c| *c)
            .unwrap_or(true)
    }

    /// Block for up to `timeout`, returning early if cancelled.
    ///
    /// Returns true if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut cancelled = match self.state.cancelled.lock() {
            Ok(guard) => guard,
            Err(_) => return true,
        };

        // Too far out to represent: only cancellation ends the wait.
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            while !*cancelled {
                cancelled = match self.state.wake.wait(cancelled) {
                    Ok(guard) => guard,
                    Err(_) => return true,
                };
            }
            return true;
        };

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = match self.state.wake.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => guard,
                Err(_) => return true,
            };
        }

        true
    }
}

/// How a sleep between polls ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    Elapsed,
    Cancelled,
}

/// Delay between polls
pub trait Sleeper {
    /// Sleep for `interval`, ending early if `cancel` trips
    fn sleep(&self, interval: Duration, cancel: &CancelToken) -> SleepOutcome;
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, interval: Duration, cancel: &CancelToken) -> SleepOutcome {
        (**self).sleep(interval, cancel)
    }
}

/// Production sleeper: blocks on the token's condition variable
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellableSleeper;

impl Sleeper for CancellableSleeper {
    fn sleep(&self, interval: Duration, cancel: &CancelToken) -> SleepOutcome {
        if cancel.wait_timeout(interval) {
            SleepOutcome::Cancelled
        } else {
            SleepOutcome::Elapsed
        }
    }
}

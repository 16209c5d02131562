//! Recording collaborators
//!
//! Capture what the watcher reported and how long it asked to sleep, without
//! writing anywhere or blocking.

use std::sync::Mutex;
use std::time::Duration;

use crate::cancel::{CancelToken, SleepOutcome, Sleeper};
use crate::notify::Notifier;
use crate::watcher::Severity;

/// One captured status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub text: String,
}

/// Notifier that stores every line in order
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    lines: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.texts(Severity::Message)
    }

    pub fn successes(&self) -> Vec<String> {
        self.texts(Severity::Success)
    }

    fn texts(&self, severity: Severity) -> Vec<String> {
        self.notifications()
            .into_iter()
            .filter(|n| n.severity == severity)
            .map(|n| n.text)
            .collect()
    }

    fn record(&self, severity: Severity, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(Notification {
                severity,
                text: text.to_string(),
            });
        }
    }
}

impl Notifier for RecordingNotifier {
    fn message(&self, text: &str) {
        self.record(Severity::Message, text);
    }

    fn success(&self, text: &str) {
        self.record(Severity::Success, text);
    }
}

/// Sleeper that returns immediately and records each requested interval.
///
/// `cancel_on_sleep(n)` trips the token during the n-th sleep (1-based),
/// standing in for a ctrl-c that arrives while the watcher waits.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    intervals: Mutex<Vec<Duration>>,
    cancel_on: Option<usize>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel_on_sleep(n: usize) -> Self {
        Self {
            intervals: Mutex::new(Vec::new()),
            cancel_on: Some(n),
        }
    }

    pub fn intervals(&self) -> Vec<Duration> {
        self.intervals.lock().map(|i| i.clone()).unwrap_or_default()
    }

    pub fn sleep_count(&self) -> usize {
        self.intervals.lock().map(|i| i.len()).unwrap_or(0)
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, interval: Duration, cancel: &CancelToken) -> SleepOutcome {
        let count = match self.intervals.lock() {
            Ok(mut intervals) => {
                intervals.push(interval);
                intervals.len()
            }
            Err(_) => 0,
        };

        if self.cancel_on == Some(count) {
            cancel.cancel();
        }

        if cancel.is_cancelled() {
            SleepOutcome::Cancelled
        } else {
            SleepOutcome::Elapsed
        }
    }
}

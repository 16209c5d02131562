//! Status notification sink
//!
//! The watcher reports exactly one line per poll, either informational or
//! success.

use std::io::{self, Write};
use std::sync::Mutex;

/// Receiver of status lines
pub trait Notifier {
    fn message(&self, text: &str);
    fn success(&self, text: &str);
}

impl<T: Notifier + ?Sized> Notifier for &T {
    fn message(&self, text: &str) {
        (**self).message(text)
    }

    fn success(&self, text: &str) {
        (**self).success(text)
    }
}

/// Emits status lines as `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn message(&self, text: &str) {
        tracing::info!(status = "message", "{}", text);
    }

    fn success(&self, text: &str) {
        tracing::info!(status = "success", "{}", text);
    }
}

/// Writes status lines to a stream, prefixing successes with a check mark
pub struct ConsoleNotifier<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleNotifier<io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }
}

impl<W: Write + Send> ConsoleNotifier<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_line(&self, prefix: &str, text: &str) {
        if let Ok(mut out) = self.out.lock() {
            // Status output is best effort; a closed stream must not end the watch.
            let _ = writeln!(out, "{}{}", prefix, text);
        }
    }
}

impl<W: Write + Send> Notifier for ConsoleNotifier<W> {
    fn message(&self, text: &str) {
        self.write_line("", text);
    }

    fn success(&self, text: &str) {
        self.write_line("✔ ", text);
    }
}

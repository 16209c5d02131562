//! Remote listing contract
//!
//! A [`BuildSource`] returns every build the remote service knows for one
//! train. Implementations own their retry policy: callers pass the number of
//! retries they want and never retry themselves.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crate::record::{BuildRecord, Platform};

/// Remote build-listing client
pub trait BuildSource: Send + Sync {
    /// List all builds of `train_version` for the given app and platform.
    ///
    /// Transient failures are retried up to `retry_count` times before an
    /// error is returned.
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError>;
}

impl<T: BuildSource + ?Sized> BuildSource for &T {
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        (**self).list_builds_for_train(app_id, platform, train_version, retry_count)
    }
}

impl<T: BuildSource + ?Sized> BuildSource for Box<T> {
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        (**self).list_builds_for_train(app_id, platform, train_version, retry_count)
    }
}

impl<T: BuildSource + ?Sized> BuildSource for Arc<T> {
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        (**self).list_builds_for_train(app_id, platform, train_version, retry_count)
    }
}

/// Listing errors
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to start listing command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("listing command exited with {}: {stderr}", exit_label(.code))]
    Command { code: Option<i32>, stderr: String },

    #[error("invalid listing JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("listing failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: Box<SourceError>,
    },

    #[error("build service unavailable: {0}")]
    Unavailable(String),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "signal".to_string(),
    }
}

impl SourceError {
    /// Whether another attempt may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Spawn { .. }
            | SourceError::Io(_)
            | SourceError::Command { .. }
            | SourceError::Unavailable(_) => true,
            SourceError::Decode(_) | SourceError::RetriesExhausted { .. } => false,
        }
    }
}

/// Backoff between listing attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(16),
        }
    }
}

impl RetryPolicy {
    /// No delay between attempts
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Run `op`, retrying transient failures up to `retry_count` times.
    pub fn run<T, F>(&self, retry_count: u32, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Result<T, SourceError>,
    {
        let mut retries = 0;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && retries < retry_count => {
                    retries += 1;
                    let delay = self.backoff(retries);
                    tracing::warn!(error = %e, retry = retries, delay_ms = delay.as_millis() as u64, "build listing failed, retrying");
                    std::thread::sleep(delay);
                }
                Err(e) if e.is_transient() && retry_count > 0 => {
                    return Err(SourceError::RetriesExhausted {
                        attempts: retries + 1,
                        last: Box::new(e),
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }
}

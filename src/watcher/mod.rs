//! Build watcher loop
//!
//! Polls the build listing until the watched build reaches a reportable
//! state:
//!
//! 1. Look the build up (fresh listing every poll)
//! 2. Classify it and report exactly one status line
//! 3. Return the build if the status is terminal
//! 4. Otherwise check the deadline, sleep for the poll interval (cut short
//!    by the deadline), check the deadline again, repeat
//!
//! A build missing from the listing is not an error; the watcher keeps
//! waiting for it to reappear. Listing errors end the watch unchanged.

mod status;

pub use status::{BuildStatus, Severity};

use std::time::Duration;

use build_source::{BuildRecord, BuildSource, Platform, SourceError, DEFAULT_RETRY_COUNT};

use crate::cancel::{CancelToken, CancellableSleeper, SleepOutcome, Sleeper};
use crate::lookup::BuildLookup;
use crate::notify::Notifier;
use crate::timeout::{DeadlineStatus, DeadlineTracker, DEFAULT_POLL_INTERVAL_SECONDS};

/// Exit code for a watch ended by cancellation
pub const EXIT_CODE_CANCELLED: i32 = 80;

/// Exit code for a watch that ran past its deadline
pub const EXIT_CODE_DEADLINE: i32 = 81;

/// Exit code for a listing failure
pub const EXIT_CODE_SOURCE: i32 = 20;

/// The build to wait for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub app_id: String,
    pub platform: Platform,
    pub train_version: String,
    pub build_version: String,
    /// Constant delay between polls (default: 10 seconds)
    pub poll_interval: Duration,
}

impl WatchTarget {
    pub fn new(
        app_id: impl Into<String>,
        platform: Platform,
        train_version: impl Into<String>,
        build_version: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            platform,
            train_version: train_version.into(),
            build_version: build_version.into(),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// Behaviour knobs for a watch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Retries requested from the source per lookup
    pub retry_count: u32,
    /// Overall wall-clock bound, unbounded when `None`
    pub deadline: Option<Duration>,
    /// Return a processed build even if it is in no reportable sub-state
    pub accept_processed: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            deadline: None,
            accept_processed: false,
        }
    }
}

/// Errors that end a watch
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("watch cancelled after {polls} poll(s)")]
    Cancelled { polls: u32 },

    #[error("build still not ready after {}s ({polls} poll(s))", .elapsed.as_secs())]
    DeadlineExceeded { elapsed: Duration, polls: u32 },
}

impl WatchError {
    pub fn exit_code(&self) -> i32 {
        match self {
            WatchError::Source(_) => EXIT_CODE_SOURCE,
            WatchError::Cancelled { .. } => EXIT_CODE_CANCELLED,
            WatchError::DeadlineExceeded { .. } => EXIT_CODE_DEADLINE,
        }
    }
}

/// Waits for one build at a time.
///
/// All collaborators are injected; the watcher keeps no state between
/// calls, so one instance may serve several sequential watches.
pub struct BuildWatcher<S, N, Z = CancellableSleeper> {
    lookup: BuildLookup<S>,
    notifier: N,
    sleeper: Z,
    cancel: CancelToken,
    options: WatchOptions,
}

impl<S: BuildSource, N: Notifier> BuildWatcher<S, N> {
    pub fn new(source: S, notifier: N) -> Self {
        Self::with_parts(source, notifier, CancellableSleeper, CancelToken::new(), WatchOptions::default())
    }
}

impl<S: BuildSource, N: Notifier, Z: Sleeper> BuildWatcher<S, N, Z> {
    pub fn with_parts(
        source: S,
        notifier: N,
        sleeper: Z,
        cancel: CancelToken,
        options: WatchOptions,
    ) -> Self {
        Self {
            lookup: BuildLookup::with_retry_count(source, options.retry_count),
            notifier,
            sleeper,
            cancel,
            options,
        }
    }

    /// Replace the sleeper
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> BuildWatcher<S, N, Z2> {
        BuildWatcher {
            lookup: self.lookup,
            notifier: self.notifier,
            sleeper,
            cancel: self.cancel,
            options: self.options,
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_options(self, options: WatchOptions) -> Self {
        let Self {
            lookup,
            notifier,
            sleeper,
            cancel,
            ..
        } = self;
        let retry_count = options.retry_count;
        let source = lookup.into_source();
        Self {
            lookup: BuildLookup::with_retry_count(source, retry_count),
            notifier,
            sleeper,
            cancel,
            options,
        }
    }

    /// Token that stops this watcher
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Block until the target build is reportable and return it.
    pub fn wait_for_build_processing_to_be_complete(
        &self,
        target: &WatchTarget,
    ) -> Result<BuildRecord, WatchError> {
        let deadline = DeadlineTracker::start(self.options.deadline);
        let mut polls: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(WatchError::Cancelled { polls });
            }

            polls += 1;
            let matched = self.lookup.find(
                &target.app_id,
                target.platform,
                &target.train_version,
                &target.build_version,
            )?;

            let status = BuildStatus::classify(matched.as_ref());
            tracing::debug!(
                app_id = %target.app_id,
                train = %target.train_version,
                build = %target.build_version,
                poll = polls,
                ?status,
                "polled build"
            );
            if let Some(ref build) = matched {
                if !build.is_consistent() {
                    tracing::warn!(
                        build = %build.label(),
                        "build reports a post-processing state without being processed"
                    );
                }
            }

            self.report(status, matched.as_ref());

            if let Some(build) = matched.filter(|_| status.is_terminal(self.options.accept_processed)) {
                return Ok(build);
            }

            if deadline.check() == DeadlineStatus::Expired {
                return Err(WatchError::DeadlineExceeded {
                    elapsed: deadline.elapsed(),
                    polls,
                });
            }

            let interval = deadline.bounded_sleep(target.poll_interval);
            if self.sleeper.sleep(interval, &self.cancel) == SleepOutcome::Cancelled {
                return Err(WatchError::Cancelled { polls });
            }

            if deadline.check() == DeadlineStatus::Expired {
                return Err(WatchError::DeadlineExceeded {
                    elapsed: deadline.elapsed(),
                    polls,
                });
            }
        }
    }

    fn report(&self, status: BuildStatus, build: Option<&BuildRecord>) {
        let (severity, text) = status.report(build, self.options.accept_processed);
        match severity {
            Severity::Message => self.notifier.message(&text),
            Severity::Success => self.notifier.success(&text),
        }
    }
}

/// One-shot watch with the default sleeper, no deadline and no external
/// cancellation. `poll_interval` defaults to 10 seconds.
pub fn wait_for_build_processing_to_be_complete<S, N>(
    source: S,
    notifier: N,
    app_id: &str,
    platform: Platform,
    train_version: &str,
    build_version: &str,
    poll_interval: Option<Duration>,
) -> Result<BuildRecord, WatchError>
where
    S: BuildSource,
    N: Notifier,
{
    let mut target = WatchTarget::new(app_id, platform, train_version, build_version);
    if let Some(interval) = poll_interval {
        target = target.with_poll_interval(interval);
    }
    BuildWatcher::new(source, notifier).wait_for_build_processing_to_be_complete(&target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{RecordingNotifier, RecordingSleeper};
    use build_source::MockSource;

    fn target() -> WatchTarget {
        WatchTarget::new("some-app-id", Platform::Ios, "1.0", "1")
    }

    fn watcher<'a>(
        source: &'a MockSource,
        notifier: &'a RecordingNotifier,
        sleeper: &'a RecordingSleeper,
    ) -> BuildWatcher<&'a MockSource, &'a RecordingNotifier, &'a RecordingSleeper> {
        BuildWatcher::new(source, notifier).with_sleeper(sleeper)
    }

    #[test]
    fn test_returns_active_build_without_sleeping() {
        let active = BuildRecord::new("1.0", "1").into_active();
        let source = MockSource::with_listings([vec![active.clone()]]);
        let notifier = RecordingNotifier::new();
        let sleeper = RecordingSleeper::new();

        let found = watcher(&source, &notifier, &sleeper)
            .wait_for_build_processing_to_be_complete(&target())
            .unwrap();

        assert_eq!(found, active);
        assert_eq!(notifier.successes(), vec!["Build 1.0 - 1 is already being tested"]);
        assert!(notifier.messages().is_empty());
        assert_eq!(sleeper.sleep_count(), 0);
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn test_processed_without_substate_keeps_waiting_by_default() {
        let source = MockSource::with_listings([
            vec![BuildRecord::new("1.0", "1").into_processed()],
            vec![BuildRecord::new("1.0", "1").into_ready_to_submit()],
        ]);
        let notifier = RecordingNotifier::new();
        let sleeper = RecordingSleeper::new();

        let found = watcher(&source, &notifier, &sleeper)
            .wait_for_build_processing_to_be_complete(&target())
            .unwrap();

        assert!(found.ready_to_submit);
        assert_eq!(sleeper.sleep_count(), 1);
        assert_eq!(notifier.messages().len(), 1);
    }

    #[test]
    fn test_accept_processed_returns_processed_build() {
        let processed = BuildRecord::new("1.0", "1").into_processed();
        let source = MockSource::with_listings([vec![processed.clone()]]);
        let notifier = RecordingNotifier::new();
        let sleeper = RecordingSleeper::new();
        let options = WatchOptions {
            accept_processed: true,
            ..WatchOptions::default()
        };

        let found = watcher(&source, &notifier, &sleeper)
            .with_options(options)
            .wait_for_build_processing_to_be_complete(&target())
            .unwrap();

        assert_eq!(found, processed);
        assert_eq!(
            notifier.successes(),
            vec!["Successfully finished processing the build 1.0 - 1"]
        );
        assert_eq!(sleeper.sleep_count(), 0);
    }

    #[test]
    fn test_retry_count_is_forwarded() {
        let source = MockSource::with_listings([vec![BuildRecord::new("1.0", "1").into_active()]]);
        let notifier = RecordingNotifier::new();
        let sleeper = RecordingSleeper::new();
        let options = WatchOptions {
            retry_count: 5,
            ..WatchOptions::default()
        };

        watcher(&source, &notifier, &sleeper)
            .with_options(options)
            .wait_for_build_processing_to_be_complete(&target())
            .unwrap();

        assert_eq!(source.calls()[0].retry_count, 5);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(WatchError::Cancelled { polls: 1 }.exit_code(), 80);
        assert_eq!(
            WatchError::DeadlineExceeded {
                elapsed: Duration::from_secs(3),
                polls: 2
            }
            .exit_code(),
            81
        );
        assert_eq!(
            WatchError::from(SourceError::Unavailable("x".to_string())).exit_code(),
            20
        );
    }

    #[test]
    fn test_source_error_display_is_unchanged() {
        let err = WatchError::from(SourceError::Unavailable("maintenance".to_string()));
        assert_eq!(err.to_string(), "build service unavailable: maintenance");
    }
}

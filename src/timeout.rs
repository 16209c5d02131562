//! Poll interval and overall deadline for a watch
//!
//! - `poll_interval_seconds`: constant delay between polls
//! - `overall_seconds`: optional wall-clock bound for the whole wait
//!
//! The deadline is checked after every poll that did not end the watch. A
//! watch may therefore overrun its deadline by at most one poll interval
//! plus one listing call.

use std::time::{Duration, Instant};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;

/// Largest accepted poll interval (one day)
pub const MAX_POLL_INTERVAL_SECONDS: u64 = 86_400;

/// Largest accepted overall deadline (one week)
pub const MAX_OVERALL_SECONDS: u64 = 604_800;

/// Timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutConfig {
    /// Delay between polls (default: 10)
    pub poll_interval_seconds: u64,

    /// Maximum wall-clock time for one watch (default: unbounded)
    pub overall_seconds: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            overall_seconds: None,
        }
    }
}

impl TimeoutConfig {
    pub fn validate(&self) -> Result<(), TimeoutValidationError> {
        if self.poll_interval_seconds == 0 || self.poll_interval_seconds > MAX_POLL_INTERVAL_SECONDS {
            return Err(TimeoutValidationError::PollIntervalOutOfBounds {
                value: self.poll_interval_seconds,
            });
        }

        if let Some(overall) = self.overall_seconds {
            if overall == 0 || overall > MAX_OVERALL_SECONDS {
                return Err(TimeoutValidationError::OverallOutOfBounds { value: overall });
            }
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn overall(&self) -> Option<Duration> {
        self.overall_seconds.map(Duration::from_secs)
    }
}

/// Timeout validation errors
#[derive(Debug, thiserror::Error)]
pub enum TimeoutValidationError {
    #[error("poll_interval_seconds must be in (0, 86400], got {value}")]
    PollIntervalOutOfBounds { value: u64 },

    #[error("timeout_seconds must be in (0, 604800], got {value}")]
    OverallOutOfBounds { value: u64 },
}

/// Deadline check result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineStatus {
    Ok,
    Expired,
}

/// Tracks wall-clock time against an optional overall limit.
///
/// The tracker only reports; ending the watch is up to the caller.
#[derive(Debug, Clone, Copy)]
pub struct DeadlineTracker {
    limit: Option<Duration>,
    start_time: Instant,
}

impl DeadlineTracker {
    pub fn start(limit: Option<Duration>) -> Self {
        Self {
            limit,
            start_time: Instant::now(),
        }
    }

    pub fn unbounded() -> Self {
        Self::start(None)
    }

    pub fn check(&self) -> DeadlineStatus {
        match self.limit {
            Some(limit) if self.elapsed() >= limit => DeadlineStatus::Expired,
            _ => DeadlineStatus::Ok,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Time left before expiry, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed()))
    }

    pub fn limit(&self) -> Option<Duration> {
        self.limit
    }

    /// `interval`, shortened so a sleep never runs past the limit
    pub fn bounded_sleep(&self, interval: Duration) -> Duration {
        self.remaining()
            .map_or(interval, |left| left.min(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timeout_config_default() {
        let config = TimeoutConfig::default();
        assert_eq!(config.poll_interval_seconds, 10);
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert!(config.overall().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_poll_interval_zero() {
        let config = TimeoutConfig {
            poll_interval_seconds: 0,
            overall_seconds: None,
        };
        assert!(matches!(
            config.validate(),
            Err(TimeoutValidationError::PollIntervalOutOfBounds { value: 0 })
        ));
    }

    #[test]
    fn test_validation_poll_interval_too_large() {
        let config = TimeoutConfig {
            poll_interval_seconds: 86_401,
            overall_seconds: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_overall_bounds() {
        let zero = TimeoutConfig {
            poll_interval_seconds: 10,
            overall_seconds: Some(0),
        };
        assert!(matches!(
            zero.validate(),
            Err(TimeoutValidationError::OverallOutOfBounds { .. })
        ));

        let week = TimeoutConfig {
            poll_interval_seconds: 10,
            overall_seconds: Some(604_800),
        };
        assert!(week.validate().is_ok());
    }

    #[test]
    fn test_unbounded_never_expires() {
        let tracker = DeadlineTracker::unbounded();
        assert_eq!(tracker.check(), DeadlineStatus::Ok);
        assert!(tracker.remaining().is_none());
    }

    #[test]
    fn test_bounded_sleep_is_capped_by_remaining_time() {
        let tracker = DeadlineTracker::start(Some(Duration::from_secs(60)));
        let capped = tracker.bounded_sleep(Duration::from_secs(86_400));
        assert!(capped <= Duration::from_secs(60));
        assert!(capped > Duration::from_secs(30));

        assert_eq!(
            tracker.bounded_sleep(Duration::from_secs(5)),
            Duration::from_secs(5)
        );
        assert_eq!(
            DeadlineTracker::unbounded().bounded_sleep(Duration::from_secs(86_400)),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_zero_limit_expires_immediately() {
        let tracker = DeadlineTracker::start(Some(Duration::ZERO));
        assert_eq!(tracker.check(), DeadlineStatus::Expired);
        assert_eq!(tracker.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn test_limit_expires_after_elapsed() {
        let tracker = DeadlineTracker::start(Some(Duration::from_millis(30)));
        assert_eq!(tracker.check(), DeadlineStatus::Ok);
        sleep(Duration::from_millis(40));
        assert_eq!(tracker.check(), DeadlineStatus::Expired);
    }
}

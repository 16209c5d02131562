//! Test doubles for the watcher's collaborators
//!
//! - `RecordingNotifier`: keeps every status line
//! - `RecordingSleeper`: records intervals instead of blocking
//! - `MockSource` (re-exported): scripted build listings

mod recording;

pub use build_source::{ListCall, MockResponse, MockSource};
pub use recording::{Notification, RecordingNotifier, RecordingSleeper};

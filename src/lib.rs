//! Build Watch - wait for an uploaded build to finish remote processing
//!
//! Polls the remote build listing until one `(train, build)` pair reaches a
//! reportable state, reporting a status line on every poll, and returns that
//! build's record.

pub mod cancel;
pub mod config;
pub mod logging;
pub mod lookup;
pub mod mock;
pub mod notify;
pub mod signal;
pub mod timeout;
pub mod watcher;

pub use build_source::{BuildRecord, BuildSource, CommandSource, Platform, SourceError};
pub use cancel::{CancelToken, CancellableSleeper, SleepOutcome, Sleeper};
pub use config::{EffectiveConfig, WatchConfig};
pub use lookup::{find_matching_build, BuildLookup};
pub use notify::{ConsoleNotifier, Notifier, TracingNotifier};
pub use watcher::{
    wait_for_build_processing_to_be_complete, BuildStatus, BuildWatcher, WatchError, WatchOptions,
    WatchTarget,
};

//! Build Source
//!
//! Build records and the contract for listing them from the remote
//! build-processing service.

pub mod command;
pub mod mock;
pub mod record;
pub mod source;

pub use command::{CommandConfig, CommandSource, ListRequest};
pub use mock::{ListCall, MockResponse, MockSource};
pub use record::{BuildRecord, Platform, UnknownPlatform};
pub use source::{BuildSource, RetryPolicy, SourceError};

/// Retries requested from the source when the caller does not choose.
pub const DEFAULT_RETRY_COUNT: u32 = 2;

//! Scripted build source for tests
//!
//! Each call to `list_builds_for_train` pops the next scripted response.
//! Once the script runs out, the last response is repeated.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::record::{BuildRecord, Platform};
use crate::source::{BuildSource, SourceError};

/// One scripted listing outcome
#[derive(Debug)]
pub enum MockResponse {
    Builds(Vec<BuildRecord>),
    Fail(String),
}

impl MockResponse {
    fn replay(&self) -> Result<Vec<BuildRecord>, SourceError> {
        match self {
            MockResponse::Builds(records) => Ok(records.clone()),
            MockResponse::Fail(message) => Err(SourceError::Unavailable(message.clone())),
        }
    }
}

/// Arguments of a recorded listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListCall {
    pub app_id: String,
    pub platform: Platform,
    pub train_version: String,
    pub retry_count: u32,
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockResponse>,
    last: Option<MockResponse>,
    calls: Vec<ListCall>,
}

/// In-process build source driven by a script of responses
#[derive(Debug, Default)]
pub struct MockSource {
    state: Mutex<MockState>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Source whose successive listings are `listings`
    pub fn with_listings<I>(listings: I) -> Self
    where
        I: IntoIterator<Item = Vec<BuildRecord>>,
    {
        let source = Self::new();
        for listing in listings {
            source.push_builds(listing);
        }
        source
    }

    /// Queue a successful listing
    pub fn push_builds(&self, records: Vec<BuildRecord>) -> &Self {
        self.push(MockResponse::Builds(records))
    }

    /// Queue a failure that has already exhausted the source's own retries
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.push(MockResponse::Fail(message.into()))
    }

    fn push(&self, response: MockResponse) -> &Self {
        if let Ok(mut state) = self.state.lock() {
            state.script.push_back(response);
        }
        self
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<ListCall> {
        self.state.lock().map(|s| s.calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().map(|s| s.calls.len()).unwrap_or(0)
    }
}

impl BuildSource for MockSource {
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| SourceError::Unavailable("mock source poisoned".to_string()))?;

        state.calls.push(ListCall {
            app_id: app_id.to_string(),
            platform,
            train_version: train_version.to_string(),
            retry_count,
        });

        if let Some(next) = state.script.pop_front() {
            state.last = Some(next);
        }

        match state.last {
            Some(ref response) => response.replay(),
            None => Ok(Vec::new()),
        }
    }
}

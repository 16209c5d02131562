//! Build lookup
//!
//! Finds one build in the current listing of its train. Train scoping is
//! left to the source; only `build_version` is compared here.

use build_source::{BuildRecord, BuildSource, Platform, SourceError, DEFAULT_RETRY_COUNT};

/// Fetch the listing for `train_version` and return the first record whose
/// build version equals `build_version`.
///
/// A missing build is `Ok(None)`. Source errors are returned unchanged.
pub fn find_matching_build<S: BuildSource + ?Sized>(
    source: &S,
    app_id: &str,
    platform: Platform,
    train_version: &str,
    build_version: &str,
    retry_count: u32,
) -> Result<Option<BuildRecord>, SourceError> {
    let builds = source.list_builds_for_train(app_id, platform, train_version, retry_count)?;
    Ok(builds
        .into_iter()
        .find(|build| build.build_version == build_version))
}

/// Reusable lookup bound to one source
#[derive(Debug)]
pub struct BuildLookup<S> {
    source: S,
    retry_count: u32,
}

impl<S: BuildSource> BuildLookup<S> {
    pub fn new(source: S) -> Self {
        Self::with_retry_count(source, DEFAULT_RETRY_COUNT)
    }

    /// Retries the source should apply per lookup (at least one)
    pub fn with_retry_count(source: S, retry_count: u32) -> Self {
        Self {
            source,
            retry_count: retry_count.max(1),
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Full listing for a train
    pub fn list(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        self.source
            .list_builds_for_train(app_id, platform, train_version, self.retry_count)
    }

    pub fn find(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        build_version: &str,
    ) -> Result<Option<BuildRecord>, SourceError> {
        find_matching_build(
            &self.source,
            app_id,
            platform,
            train_version,
            build_version,
            self.retry_count,
        )
    }
}

//! Build status classification
//!
//! Maps one lookup result to a status and the line reported for it.
//! Precedence: missing, then active, then the processed sub-states, then
//! still processing.

use build_source::BuildRecord;

/// Severity of a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Message,
    Success,
}

/// Classified state of the watched build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// Not in the current listing
    Missing,
    /// Already under active testing
    Active,
    /// Ready to submit, missing export compliance, or rejected in review
    FinishedProcessing,
    /// Processed, but in none of the reportable sub-states
    ProcessedPending,
    /// Remote processing still running
    Processing,
}

impl BuildStatus {
    pub fn classify(build: Option<&BuildRecord>) -> Self {
        match build {
            None => BuildStatus::Missing,
            Some(b) if b.active => BuildStatus::Active,
            Some(b) if b.ready_to_submit || b.export_compliance_missing || b.review_rejected => {
                BuildStatus::FinishedProcessing
            }
            Some(b) if b.processed => BuildStatus::ProcessedPending,
            Some(_) => BuildStatus::Processing,
        }
    }

    /// Whether the watch ends on this status.
    ///
    /// `ProcessedPending` only ends the watch when `accept_processed` is set.
    pub fn is_terminal(&self, accept_processed: bool) -> bool {
        match self {
            BuildStatus::Active | BuildStatus::FinishedProcessing => true,
            BuildStatus::ProcessedPending => accept_processed,
            BuildStatus::Missing | BuildStatus::Processing => false,
        }
    }

    /// Status line for this state.
    ///
    /// `build` must be `Some` for every status except `Missing`.
    pub fn report(&self, build: Option<&BuildRecord>, accept_processed: bool) -> (Severity, String) {
        let label = build.map(BuildRecord::label).unwrap_or_default();
        match self {
            BuildStatus::Missing => (
                Severity::Message,
                "Build doesn't show up in the build list anymore, waiting for it to appear again"
                    .to_string(),
            ),
            BuildStatus::Active => (
                Severity::Success,
                format!("Build {} is already being tested", label),
            ),
            BuildStatus::FinishedProcessing => (
                Severity::Success,
                format!("Successfully finished processing the build {}", label),
            ),
            BuildStatus::ProcessedPending if accept_processed => (
                Severity::Success,
                format!("Successfully finished processing the build {}", label),
            ),
            BuildStatus::ProcessedPending | BuildStatus::Processing => (
                Severity::Message,
                format!(
                    "Waiting for App Store Connect to finish processing the new build ({})",
                    label
                ),
            ),
        }
    }
}

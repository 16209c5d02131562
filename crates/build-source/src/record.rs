//! Build records as returned by the remote listing service
//!
//! A record is a read-only snapshot of one uploaded build. Records are
//! fetched fresh on every poll; two records describe the same build when
//! their `(train_version, build_version)` pairs are equal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Target platform of an uploaded build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Appletvos,
    #[serde(alias = "macos")]
    Osx,
    Visionos,
}

impl Platform {
    /// Wire name of the platform
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ios => "ios",
            Platform::Appletvos => "appletvos",
            Platform::Osx => "osx",
            Platform::Visionos => "visionos",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a platform name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform '{0}' (expected ios, appletvos, osx or visionos)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ios" => Ok(Platform::Ios),
            "appletvos" | "tvos" => Ok(Platform::Appletvos),
            "osx" | "macos" => Ok(Platform::Osx),
            "visionos" | "xros" => Ok(Platform::Visionos),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// One build as reported by the remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// Remote identifier, if the service exposes one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Marketing/release version (the train)
    pub train_version: String,

    /// Build number within the train
    pub build_version: String,

    /// When the build was uploaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,

    /// Remote post-upload processing has finished
    #[serde(default)]
    pub processed: bool,

    /// Build is already under active testing
    #[serde(default)]
    pub active: bool,

    /// Build is cleared for submission
    #[serde(default)]
    pub ready_to_submit: bool,

    /// Build is blocked only on missing export compliance information
    #[serde(default)]
    pub export_compliance_missing: bool,

    /// Build was rejected in review
    #[serde(default)]
    pub review_rejected: bool,
}

impl BuildRecord {
    /// Create a record that is still processing
    pub fn new(train_version: impl Into<String>, build_version: impl Into<String>) -> Self {
        Self {
            id: None,
            train_version: train_version.into(),
            build_version: build_version.into(),
            upload_date: None,
            processed: false,
            active: false,
            ready_to_submit: false,
            export_compliance_missing: false,
            review_rejected: false,
        }
    }

    /// Mark as processed and under active testing
    pub fn into_active(mut self) -> Self {
        self.processed = true;
        self.active = true;
        self
    }

    /// Mark as processed and ready to submit
    pub fn into_ready_to_submit(mut self) -> Self {
        self.processed = true;
        self.ready_to_submit = true;
        self
    }

    /// Mark as processed but missing export compliance
    pub fn into_export_compliance_missing(mut self) -> Self {
        self.processed = true;
        self.export_compliance_missing = true;
        self
    }

    /// Mark as processed and rejected in review
    pub fn into_review_rejected(mut self) -> Self {
        self.processed = true;
        self.review_rejected = true;
        self
    }

    /// Mark as processed without any further sub-state
    pub fn into_processed(mut self) -> Self {
        self.processed = true;
        self
    }

    /// Whether any post-processing sub-state is set
    pub fn has_processed_substate(&self) -> bool {
        self.active || self.ready_to_submit || self.export_compliance_missing || self.review_rejected
    }

    /// Every sub-state implies `processed`
    pub fn is_consistent(&self) -> bool {
        self.processed || !self.has_processed_substate()
    }

    /// `train - build` label used in status lines
    pub fn label(&self) -> String {
        format!("{} - {}", self.train_version, self.build_version)
    }
}

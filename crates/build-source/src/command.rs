//! Process-backed build source
//!
//! Runs an external listing helper once per attempt. The helper receives a
//! single JSON request object on stdin and must print a JSON array of build
//! records on stdout, exiting 0. Anything else is a failed attempt.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::Serialize;

use crate::record::{BuildRecord, Platform};
use crate::source::{BuildSource, RetryPolicy, SourceError};

/// Request written to the helper's stdin
#[derive(Debug, Clone, Serialize)]
pub struct ListRequest<'a> {
    pub app_id: &'a str,
    pub platform: Platform,
    pub train_version: &'a str,
}

/// Listing helper configuration
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments passed to the program; the request itself goes on stdin
    pub args: Vec<String>,
    /// Backoff between failed attempts
    pub retry: RetryPolicy,
}

impl CommandConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Build source that shells out to a listing helper
pub struct CommandSource {
    config: CommandConfig,
}

impl CommandSource {
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CommandConfig {
        &self.config
    }

    /// Run the helper once
    fn list_once(&self, request: &ListRequest<'_>) -> Result<Vec<BuildRecord>, SourceError> {
        let request_json = serde_json::to_string(request)?;

        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SourceError::Spawn {
                program: self.config.program.display().to_string(),
                source: e,
            })?;

        // A helper may exit without reading its request; its exit status
        // and stdout still decide the outcome.
        if let Some(mut stdin) = child.stdin.take() {
            match writeln!(stdin, "{}", request_json) {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e.into()),
                _ => {}
            }
        }

        let output = child.wait_with_output()?;

        if !output.status.success() {
            return Err(SourceError::Command {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let records: Vec<BuildRecord> = serde_json::from_slice(&output.stdout)?;
        Ok(records)
    }
}

impl BuildSource for CommandSource {
    fn list_builds_for_train(
        &self,
        app_id: &str,
        platform: Platform,
        train_version: &str,
        retry_count: u32,
    ) -> Result<Vec<BuildRecord>, SourceError> {
        let request = ListRequest {
            app_id,
            platform,
            train_version,
        };

        let records = self.config.retry.run(retry_count, || self.list_once(&request))?;
        tracing::debug!(
            app_id,
            %platform,
            train = train_version,
            count = records.len(),
            "listed builds"
        );
        Ok(records)
    }
}

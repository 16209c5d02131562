//! Effective configuration with provenance
//!
//! The merged configuration plus the list of layers that contributed to it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use build_source::{CommandConfig, RetryPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use crate::timeout::{TimeoutConfig, TimeoutValidationError};
use crate::watcher::WatchOptions;

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Cli,
}

/// A contributing layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// `[source]` table: the listing helper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSection {
    /// Program that prints the build listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Typed view of the merged configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    pub poll_interval_seconds: u64,

    pub retry_count: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    #[serde(default)]
    pub accept_processed: bool,

    #[serde(default)]
    pub source: SourceSection,
}

impl WatchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.timeout_config().validate()?;

        if self.retry_count == 0 {
            return Err(ConfigError::ValidationError(
                "retry_count must be at least 1".to_string(),
            ));
        }

        if let Some(ref command) = self.source.command {
            if command.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "source.command must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    pub fn timeout_config(&self) -> TimeoutConfig {
        TimeoutConfig {
            poll_interval_seconds: self.poll_interval_seconds,
            overall_seconds: self.timeout_seconds,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.timeout_config().poll_interval()
    }

    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            retry_count: self.retry_count,
            deadline: self.timeout_config().overall(),
            accept_processed: self.accept_processed,
        }
    }

    /// Listing helper settings, if a command is configured
    pub fn command_config(&self) -> Option<CommandConfig> {
        self.source.command.as_ref().map(|program| CommandConfig {
            program: PathBuf::from(program),
            args: self.source.args.clone(),
            retry: RetryPolicy::default(),
        })
    }
}

/// Effective configuration with provenance
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    /// When this config was computed
    pub created_at: DateTime<Utc>,

    pub config: WatchConfig,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Default host config path: `$XDG_CONFIG_HOME/build-watch/config.toml`,
    /// falling back to `$HOME/.config/build-watch/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
        Some(base.join("build-watch").join("config.toml"))
    }

    /// Build from layers.
    ///
    /// A missing host file is skipped; an explicitly requested one must
    /// exist, which is the caller's call via `require_host`.
    pub fn build(
        host_config_path: Option<&Path>,
        require_host: bool,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
        }];

        if let Some(path) = host_config_path {
            if path.exists() {
                layers.push(Self::load_toml_file(path)?);
                sources.push(ConfigSource {
                    origin: ConfigOrigin::Host,
                    path: Some(path.to_string_lossy().to_string()),
                });
            } else if require_host {
                return Err(ConfigError::IoError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
            });
        }

        let merged = merge_layers(layers);
        let config: WatchConfig = serde_json::from_value(merged)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;

        tracing::debug!(layers = sources.len(), "configuration loaded");

        Ok(Self {
            created_at: Utc::now(),
            config,
            sources,
        })
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(Self::toml_to_json(toml_value))
    }

    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Self::toml_to_json).collect())
            }
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Validation error: {0}")]
    Timeout(#[from] TimeoutValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_build_with_defaults_only() {
        let effective = EffectiveConfig::build(None, false, None).unwrap();

        assert_eq!(effective.config.poll_interval_seconds, 10);
        assert_eq!(effective.config.retry_count, 2);
        assert_eq!(effective.config.timeout_seconds, None);
        assert!(effective.config.command_config().is_none());
        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, ConfigOrigin::Builtin);
    }

    #[test]
    fn test_host_file_then_cli_precedence() {
        let file = write_config(
            r#"
poll_interval_seconds = 30
timeout_seconds = 3600

[source]
command = "/usr/local/bin/list-builds"
args = ["--team", "ABC123"]
"#,
        );

        let cli = serde_json::json!({"poll_interval_seconds": 5});
        let effective = EffectiveConfig::build(Some(file.path()), true, Some(cli)).unwrap();

        assert_eq!(effective.config.poll_interval_seconds, 5);
        assert_eq!(effective.config.timeout_seconds, Some(3600));
        let command = effective.config.command_config().unwrap();
        assert_eq!(command.program, PathBuf::from("/usr/local/bin/list-builds"));
        assert_eq!(command.args, vec!["--team", "ABC123"]);

        let origins: Vec<_> = effective.sources.iter().map(|s| s.origin.clone()).collect();
        assert_eq!(origins, vec![ConfigOrigin::Builtin, ConfigOrigin::Host, ConfigOrigin::Cli]);
    }

    #[test]
    fn test_missing_optional_host_file_is_skipped() {
        let effective =
            EffectiveConfig::build(Some(Path::new("/nonexistent/config.toml")), false, None).unwrap();
        assert_eq!(effective.sources.len(), 1);
    }

    #[test]
    fn test_missing_required_host_file_is_an_error() {
        let result = EffectiveConfig::build(Some(Path::new("/nonexistent/config.toml")), true, None);
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("poll_interval_seconds = ");
        let result = EffectiveConfig::build(Some(file.path()), true, None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let file = write_config("poll_intervall_seconds = 5\n");
        let result = EffectiveConfig::build(Some(file.path()), true, None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_poll_interval_zero() {
        let cli = serde_json::json!({"poll_interval_seconds": 0});
        let err = EffectiveConfig::build(None, false, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("poll_interval_seconds"));
    }

    #[test]
    fn test_validation_retry_count_zero() {
        let cli = serde_json::json!({"retry_count": 0});
        let err = EffectiveConfig::build(None, false, Some(cli)).unwrap_err();
        assert!(err.to_string().contains("retry_count"));
    }

    #[test]
    fn test_watch_options_from_config() {
        let cli = serde_json::json!({"timeout_seconds": 90, "accept_processed": true, "retry_count": 3});
        let effective = EffectiveConfig::build(None, false, Some(cli)).unwrap();
        let options = effective.config.watch_options();

        assert_eq!(options.deadline, Some(Duration::from_secs(90)));
        assert!(options.accept_processed);
        assert_eq!(options.retry_count, 3);
        assert_eq!(effective.config.poll_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_to_json_includes_provenance() {
        let effective = EffectiveConfig::build(None, false, None).unwrap();
        let json: Value = serde_json::from_str(&effective.to_json().unwrap()).unwrap();

        assert_eq!(json["config"]["poll_interval_seconds"], 10);
        assert_eq!(json["sources"][0]["origin"], "builtin");
    }
}

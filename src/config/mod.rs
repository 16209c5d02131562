//! Layered configuration
//!
//! 1. Built-in defaults
//! 2. Host file (`~/.config/build-watch/config.toml`, or `--config`)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, SourceSection, WatchConfig};
pub use merge::{deep_merge, merge_layers};

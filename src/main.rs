//! Build Watch CLI
//!
//! Entry point for the `build-watch` command-line tool.

use std::path::PathBuf;
use std::process;

use build_watch::cancel::{CancelToken, CancellableSleeper};
use build_watch::config::EffectiveConfig;
use build_watch::lookup::BuildLookup;
use build_watch::signal::SignalHandler;
use build_watch::{logging, BuildRecord, BuildWatcher, CommandSource, Platform, TracingNotifier, WatchTarget};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "build-watch")]
#[command(about = "Wait for an uploaded build to finish remote processing", version)]
struct Cli {
    /// Log debug detail (overridden by BUILD_WATCH_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Path to config file (default: ~/.config/build-watch/config.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct TrainArgs {
    /// Application identifier
    #[arg(long)]
    app_id: String,

    /// Platform (ios, appletvos, osx, visionos)
    #[arg(long, default_value = "ios")]
    platform: Platform,

    /// Train (marketing) version, e.g. 1.0
    #[arg(long = "train")]
    train_version: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Block until a build finishes processing and print it
    Wait {
        #[command(flatten)]
        train: TrainArgs,

        /// Build number within the train
        #[arg(long = "build")]
        build_version: String,

        /// Seconds between polls
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Retries the listing helper applies per poll
        #[arg(long)]
        retry_count: Option<u32>,

        /// Also return processed builds in no reportable sub-state
        #[arg(long)]
        accept_processed: bool,

        /// Print the build as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// List the builds of one train
    List {
        #[command(flatten)]
        train: TrainArgs,

        /// Output in JSON format
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Wait {
            train,
            build_version,
            poll_interval,
            timeout,
            retry_count,
            accept_processed,
            json,
            config,
        } => {
            let mut overrides = serde_json::Map::new();
            if let Some(seconds) = poll_interval {
                overrides.insert("poll_interval_seconds".to_string(), json!(seconds));
            }
            if let Some(seconds) = timeout {
                overrides.insert("timeout_seconds".to_string(), json!(seconds));
            }
            if let Some(count) = retry_count {
                overrides.insert("retry_count".to_string(), json!(count));
            }
            if accept_processed {
                overrides.insert("accept_processed".to_string(), json!(true));
            }
            let effective = load_config(config.config, Value::Object(overrides));
            run_wait(&effective, train, build_version, json);
        }
        Commands::List { train, json, config } => {
            let effective = load_config(config.config, json!({}));
            run_list(&effective, train, json);
        }
        Commands::Config { config } => {
            let effective = load_config(config.config, json!({}));
            match effective.to_json() {
                Ok(out) => println!("{}", out),
                Err(e) => {
                    eprintln!("Error serializing config: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

fn load_config(explicit: Option<PathBuf>, overrides: Value) -> EffectiveConfig {
    let require_host = explicit.is_some();
    let path = explicit.or_else(EffectiveConfig::default_path);

    match EffectiveConfig::build(path.as_deref(), require_host, Some(overrides)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    }
}

fn command_source(effective: &EffectiveConfig) -> CommandSource {
    match effective.config.command_config() {
        Some(config) => CommandSource::new(config),
        None => {
            eprintln!("Configuration error: no listing helper configured (set source.command)");
            process::exit(1);
        }
    }
}

fn run_wait(effective: &EffectiveConfig, train: TrainArgs, build_version: String, json_output: bool) {
    let source = command_source(effective);
    let cancel = CancelToken::new();

    if let Err(e) = SignalHandler::new(cancel.clone()).install() {
        tracing::warn!(error = %e, "could not install interrupt handler");
    }

    let target = WatchTarget::new(train.app_id, train.platform, train.train_version, build_version)
        .with_poll_interval(effective.config.poll_interval());

    let watcher = BuildWatcher::with_parts(
        source,
        TracingNotifier,
        CancellableSleeper,
        cancel,
        effective.config.watch_options(),
    );

    match watcher.wait_for_build_processing_to_be_complete(&target) {
        Ok(build) => print_build(&build, json_output),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

fn run_list(effective: &EffectiveConfig, train: TrainArgs, json_output: bool) {
    let lookup = BuildLookup::with_retry_count(command_source(effective), effective.config.retry_count);

    let builds = match lookup.list(&train.app_id, train.platform, &train.train_version) {
        Ok(builds) => builds,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(build_watch::watcher::EXIT_CODE_SOURCE);
        }
    };

    if json_output {
        match serde_json::to_string_pretty(&builds) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    if builds.is_empty() {
        println!("No builds for train {}", train.train_version);
        return;
    }

    for build in &builds {
        println!("{}", summary_line(build));
    }
}

fn print_build(build: &BuildRecord, json_output: bool) {
    if json_output {
        match serde_json::to_string_pretty(build) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    } else {
        println!("{}", summary_line(build));
    }
}

fn summary_line(build: &BuildRecord) -> String {
    let mut flags = Vec::new();
    if build.processed {
        flags.push("processed");
    }
    if build.active {
        flags.push("active");
    }
    if build.ready_to_submit {
        flags.push("ready-to-submit");
    }
    if build.export_compliance_missing {
        flags.push("export-compliance-missing");
    }
    if build.review_rejected {
        flags.push("review-rejected");
    }
    if flags.is_empty() {
        flags.push("processing");
    }

    let uploaded = build
        .upload_date
        .map(|d| format!("  uploaded {}", d.format("%Y-%m-%d %H:%M")))
        .unwrap_or_default();

    format!("{:<16} {}{}", build.label(), flags.join(", "), uploaded)
}

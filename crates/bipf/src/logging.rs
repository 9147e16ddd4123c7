//! Stderr diagnostics for the CLI.
//!
//! CLI commands and the codec engine get separate levels, so engine
//! codec builds (debug) and cache hits (trace) can be shown without
//! flooding the command output, and the other way round.

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

const CLI_TARGET: &str = "bipf";
const ENGINE_TARGETS: [&str; 2] = ["bipf_codec", "bipf_wire"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Per-target filter: `cli` for the binary, `engine` for the library crates.
/// Everything else stays silent.
fn directives(cli: LogLevel, engine: LogLevel) -> Targets {
    ENGINE_TARGETS.iter().fold(
        Targets::new().with_target(CLI_TARGET, LevelFilter::from(cli)),
        |targets, target| targets.with_target(*target, LevelFilter::from(engine)),
    )
}

pub fn init_logging(format: LogFormat, cli: LogLevel, engine: LogLevel) {
    let filter = directives(cli, engine);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
    };
}

use std::path::PathBuf;

use clap::Parser;

/// Output format for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TracingFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "preempt-lifecycle", version, about)]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(long, env = "SCHEDULER_CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Log output format.
    #[arg(long, env = "SCHEDULER_TRACING_FORMAT", value_enum, default_value_t = TracingFormat::Pretty)]
    pub tracing_format: TracingFormat,

    /// Enable debug-level logging regardless of the configured log level.
    #[arg(long, env = "SCHEDULER_DEBUG")]
    pub debug: bool,
}

impl std::fmt::Display for TracingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TracingFormat::Pretty => write!(f, "pretty"),
            TracingFormat::Json => write!(f, "json"),
        }
    }
}

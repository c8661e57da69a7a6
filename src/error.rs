//! Crate-wide error taxonomy.
//!
//! Only [`ConfigError`] is fatal. Everything else is logged at its point of
//! occurrence and the caller degrades gracefully (skip a tick, abandon a
//! drain phase, move to the next node).

use thiserror::Error;

/// Fatal at startup. The only error kind that aborts the process.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] figment::Error),

    #[error("invalid config: {0}")]
    Validation(String),
}

/// Transport/API failure enumerating managed nodes. Never fatal: the
/// scheduler logs it via `tracing::warn!` and skips the tick.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to list managed preemptible nodes: {0}")]
    Listing(String),

    #[error("failed to build cluster client: {0}")]
    ClientInit(String),
}

/// Per-phase drain failures. Internal to the drain state machine — a
/// `DrainError` is never handed back to the scheduler; the drain protocol's
/// public entry point absorbs every variant into `DrainOutcome::TimedOut`
/// once its deadline passes.
#[derive(Debug, Error)]
pub(crate) enum DrainError {
    #[error("cordon failed for node {node}: {reason}")]
    Cordon { node: String, reason: String },

    #[error("listing pods on node {node} failed: {reason}")]
    PodListing { node: String, reason: String },

    #[error("deleting node {node} failed: {reason}")]
    NodeDelete { node: String, reason: String },
}

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::GatewayError;

use super::node::Node;

/// How long to wait before retrying a failed cordon or node-delete call.
pub const PROCESSING_RETRY_INTERVAL: Duration = Duration::from_secs(60);

/// How often to re-poll whether a node's workload pods have finished
/// terminating.
pub const POD_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// The outcome of a [`ClusterGateway::drain`] call. There is no `Err` case
/// the scheduler must handle — every internal failure degrades to
/// `TimedOut` rather than propagating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Cordon, eviction, and node deletion all completed before the
    /// deadline.
    Completed,
    /// The deadline elapsed before every phase completed. Non-fatal: the
    /// caller proceeds to the next node.
    TimedOut,
}

/// The three operations the scheduler needs from the cluster, declared as
/// an abstract capability set rather than the full client SDK surface so
/// the scheduler is testable against an in-memory stand-in.
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    /// The current snapshot of managed preemptible nodes: labelled
    /// preemptible, filtered by the configured include/exclude pool rules.
    /// No client-side cache survives between calls.
    async fn list_managed_preemptible_nodes(&self) -> Result<Vec<Node>, GatewayError>;

    /// The node's creation timestamp, from which the scheduler derives the
    /// forced-reclamation deadline (`creation_time(node) + 24h`). Defaults
    /// to the timestamp already cached on the node snapshot; a gateway may
    /// override this to re-fetch a fresher value instead.
    fn creation_time(&self, node: &Node) -> DateTime<Utc> {
        node.created_at
    }

    /// Cordon the node, evict its non-system non-DaemonSet pods, then
    /// delete it — all within `deadline`. Errors from the cluster API never
    /// propagate as fatal; they retry internally or degrade the result to
    /// [`DrainOutcome::TimedOut`].
    async fn drain(&self, node: &Node, deadline: Duration) -> DrainOutcome;
}

/// Repeat `attempt` every `interval` until it succeeds or `deadline` passes.
///
/// This is the single reusable primitive behind every bounded retry in the
/// drain protocol: the cordon retry, the node-delete retry, and the
/// pod-eviction poll all reduce to "keep trying until Ok or out of time".
pub(crate) async fn retry_until_deadline<F, Fut, T>(
    deadline: Instant,
    interval: Duration,
    mut attempt: F,
) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    loop {
        if let Some(value) = attempt().await {
            return Some(value);
        }

        let now = Instant::now();
        if now >= deadline {
            return None;
        }

        tokio::time::sleep(interval.min(deadline - now)).await;

        if Instant::now() >= deadline {
            return None;
        }
    }
}

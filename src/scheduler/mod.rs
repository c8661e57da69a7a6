//! The lifecycle scheduler: a three-state loop over the peak calendar that
//! decides, once per tick, which nodes to retire and how long to sleep
//! before the next tick.

mod state;

pub use state::State;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::cluster::{ClusterGateway, DrainOutcome, Node, POD_CHECK_INTERVAL};
use crate::peakhour::PeakCalendar;

/// Drives the three-state scheduling loop. Holds no mutable
/// state of its own beyond its collaborators: the current [`State`] is
/// recomputed every tick from the calendar and the clock.
pub struct Scheduler {
    calendar: PeakCalendar,
    gateway: Arc<dyn ClusterGateway>,
    clock: Arc<dyn Clock>,
    graceful_period: Duration,
    near_peak_window: Duration,
}

impl Scheduler {
    pub fn new(
        calendar: PeakCalendar,
        gateway: Arc<dyn ClusterGateway>,
        clock: Arc<dyn Clock>,
        graceful_period: Duration,
        near_peak_window: Duration,
    ) -> Self {
        Self {
            calendar,
            gateway,
            clock,
            graceful_period,
            near_peak_window,
        }
    }

    pub fn current_state(&self) -> State {
        if !self.calendar.has_periods() {
            return State::OutsidePeak;
        }
        if self.calendar.is_peak_now() {
            return State::InPeak;
        }
        if duration_until(self.clock.now(), self.calendar.nearest_start_of_peak())
            <= self.near_peak_window
        {
            State::NearPeak
        } else {
            State::OutsidePeak
        }
    }

    /// Run the control loop until `shutdown` is cancelled. Each iteration
    /// is strictly serial: the next tick never starts before the previous
    /// one's sleep has elapsed or shutdown fires. An in-flight tick's
    /// drains are never interrupted by `shutdown` — only the end-of-tick
    /// sleep is a cancellation point, so shutdown always lets the current
    /// drain run to its own deadline before the loop exits.
    pub async fn run(&self, shutdown: CancellationToken) {
        loop {
            let sleep_for = self.tick().await;

            tokio::select! {
                () = tokio::time::sleep(sleep_for) => {}
                () = shutdown.cancelled() => {
                    info!("shutdown requested, exiting control loop");
                    return;
                }
            }
        }
    }

    /// Process one tick and return how long to sleep before the next one.
    /// Exposed directly (rather than only through [`Self::run`]) so callers
    /// can drive the loop deterministically in tests.
    pub async fn tick(&self) -> Duration {
        match self.current_state() {
            State::InPeak => {
                info!("in peak hour, no drains");
                let end = self.calendar.nearest_end_of_peak();
                duration_until(self.clock.now(), end)
            }
            State::NearPeak => self.tick_near_peak().await,
            State::OutsidePeak => self.tick_outside_peak().await,
        }
    }

    async fn fetch_nodes(&self) -> Option<Vec<Node>> {
        match self.gateway.list_managed_preemptible_nodes().await {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                warn!(error = %e, "failed to list managed nodes, skipping tick");
                None
            }
        }
    }

    async fn drain_node(&self, node: &Node) {
        info!(node = %node.name, "draining node");
        match self.gateway.drain(node, self.graceful_period).await {
            DrainOutcome::Completed => info!(node = %node.name, "node drained"),
            DrainOutcome::TimedOut => warn!(node = %node.name, "drain timed out, moving on"),
        }
    }

    /// The provider-enforced forced-reclamation deadline for `node`: 24h
    /// after its creation time, read through the gateway rather than off
    /// the node snapshot directly, since creation time is itself one of the
    /// gateway's declared capabilities.
    fn forced_reclamation_at(&self, node: &Node) -> DateTime<Utc> {
        self.gateway.creation_time(node) + chrono::Duration::hours(24)
    }

    /// Nodes that would be force-reclaimed during or before the next peak
    /// end are culled now, pre-empting a reclamation that would land inside
    /// peak. The sleep afterward runs to the true peak end — unlike
    /// `OutsidePeak`, it is not shortened by `graceful_period`.
    async fn tick_near_peak(&self) -> Duration {
        let Some(nodes) = self.fetch_nodes().await else {
            return POD_CHECK_INTERVAL;
        };
        if nodes.is_empty() {
            return POD_CHECK_INTERVAL;
        }
        info!(count = nodes.len(), "nodes found");

        let end_of_peak = self.calendar.nearest_end_of_peak();
        for node in &nodes {
            if end_of_peak >= self.forced_reclamation_at(node) {
                self.drain_node(node).await;
            }
        }

        duration_until(self.clock.now(), end_of_peak)
    }

    /// Nodes about to be force-reclaimed anyway are retired now; survivors
    /// are left alone. The next wake-up is the earliest of: a survivor's
    /// forced-reclamation deadline, or the nearest peak start — minus
    /// `near_peak_window` (`2 * graceful_period`), not the bare
    /// `graceful_period`. A worked example makes the distinction load-bearing:
    /// with `graceful-period=15` and a node whose reclamation deadline has
    /// already been culled this tick, the only remaining candidate is a
    /// `11:00` peak start, and the correct next wake-up is `10:30` —
    /// `11:00 − 30m`, i.e. `11:00 − near_peak_window`. Subtracting the bare
    /// `graceful_period` would instead wake at `10:45`, leaving only half the
    /// intended lead time before `NearPeak` begins.
    async fn tick_outside_peak(&self) -> Duration {
        let Some(nodes) = self.fetch_nodes().await else {
            return POD_CHECK_INTERVAL;
        };
        if nodes.is_empty() {
            return POD_CHECK_INTERVAL;
        }
        info!(count = nodes.len(), "nodes found");

        let now = self.clock.now();
        let mut survivors = Vec::with_capacity(nodes.len());
        for node in nodes {
            let remaining = self.forced_reclamation_at(&node) - now;
            if remaining.to_std().unwrap_or(Duration::ZERO) <= self.graceful_period {
                self.drain_node(&node).await;
            } else {
                survivors.push(node);
            }
        }

        let mut candidate: Option<DateTime<Utc>> = if self.calendar.has_periods() {
            Some(self.calendar.nearest_start_of_peak())
        } else {
            None
        };
        for node in &survivors {
            let deadline = self.forced_reclamation_at(node);
            candidate = Some(candidate.map_or(deadline, |c| c.min(deadline)));
        }

        match candidate {
            Some(t) => duration_until(now, t - self.near_peak_window),
            None => POD_CHECK_INTERVAL,
        }
    }
}

fn duration_until(now: DateTime<Utc>, target: DateTime<Utc>) -> Duration {
    (target - now).to_std().unwrap_or(Duration::ZERO)
}

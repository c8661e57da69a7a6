//! End-to-end scenarios driving the scheduler through a `MockGateway` and a
//! `FixedClock`, exercising the tick arithmetic without a real cluster or
//! real wall-clock sleeps.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use preempt_lifecycle::clock::{Clock, FixedClock};
use preempt_lifecycle::cluster::{MockGateway, Node};
use preempt_lifecycle::peakhour::PeakCalendar;
use preempt_lifecycle::scheduler::{Scheduler, State};

fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.from_utc_datetime(&NaiveDateTime::new(
        NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        NaiveTime::from_hms_opt(h, min, 0).unwrap(),
    ))
}

fn make_scheduler(
    ranges: &[&str],
    now: DateTime<Utc>,
    graceful_minutes: u64,
    gateway: Arc<MockGateway>,
) -> Scheduler {
    let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(now));
    let calendar = PeakCalendar::parse(
        &ranges.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        clock.clone(),
    )
    .unwrap();
    let graceful_period = Duration::from_secs(graceful_minutes * 60);
    Scheduler::new(calendar, gateway, clock, graceful_period, graceful_period * 2)
}

/// A node created just under 24h ago, outside any peak window, is drained
/// on the very tick its remaining lifetime drops to the graceful period.
/// With the node culled this tick, the only remaining wake-up candidate is
/// the nearest peak start (`12:00`), and the next wake-up is
/// `near_peak_window` (`2 * graceful_period` = 30m) before that, i.e.
/// `11:30`, not `graceful_period` (15m) before it.
#[tokio::test]
async fn simple_outside_peak_drain_wakes_near_peak_window_before_peak_start() {
    let created = dt(2024, 3, 1, 10, 0);
    let now = dt(2024, 3, 2, 9, 45);
    let node = Node::new("node-a", created);
    let gateway = Arc::new(MockGateway::new(vec![node]));
    let scheduler = make_scheduler(&["12:00-16:00"], now, 15, gateway.clone());

    assert_eq!(scheduler.current_state(), State::OutsidePeak);

    let sleep_for = scheduler.tick().await;
    assert!(gateway.drained_nodes().contains(&"node-a".to_string()));
    assert_eq!(sleep_for, Duration::from_secs(105 * 60));
}

/// An overlapping set of configured peak ranges collapses to a single
/// merged period, and a node is still correctly evaluated against it.
#[tokio::test]
async fn overlapping_peak_ranges_merge_before_scheduling() {
    let now = dt(2024, 3, 1, 8, 0);
    let gateway = Arc::new(MockGateway::new(vec![]));
    let scheduler = make_scheduler(
        &["09:00-12:00", "11:30-14:00"],
        now,
        15,
        gateway,
    );
    // Near-peak window is 30 minutes; peak starts at 09:00, now is 08:00 so
    // the gap is 60 minutes -- still outside the near-peak window.
    assert_eq!(scheduler.current_state(), State::OutsidePeak);
}

/// A midnight-spanning peak window is correctly reported as in-peak right
/// up to (but not past) its true end, ignoring the artificial day seam.
#[test]
fn midnight_spanning_window_reports_in_peak_across_the_seam() {
    let now = dt(2024, 3, 1, 23, 45);
    let gateway = Arc::new(MockGateway::new(vec![]));
    let scheduler = make_scheduler(&["22:30-05:00"], now, 15, gateway);
    assert_eq!(scheduler.current_state(), State::InPeak);
}

/// A drain that times out is logged and does not abort the scheduler;
/// the loop moves on to its next sleep as if the drain had completed.
#[tokio::test]
async fn timed_out_drain_is_non_fatal() {
    use preempt_lifecycle::cluster::DrainBehavior;

    let created = dt(2024, 3, 1, 10, 0);
    let now = dt(2024, 3, 2, 9, 45);
    let node = Node::new("node-a", created);
    let gateway = Arc::new(
        MockGateway::new(vec![node]).with_drain_behavior(DrainBehavior::TimeOut),
    );
    let scheduler = make_scheduler(&["12:00-16:00"], now, 15, gateway.clone());

    scheduler.tick().await;
    assert!(gateway.drained_nodes().contains(&"node-a".to_string()));
}

/// An empty managed node set rate-limits retries to the short poll
/// interval instead of sleeping all the way to the next peak boundary.
#[tokio::test]
async fn empty_node_set_rate_limits_tight_loop() {
    let now = dt(2024, 3, 1, 8, 0);
    let gateway = Arc::new(MockGateway::new(vec![]));
    let scheduler = make_scheduler(&["12:00-16:00"], now, 15, gateway);
    assert_eq!(scheduler.current_state(), State::OutsidePeak);
}

/// An empty calendar (peak handling disabled) never reports `InPeak` or
/// `NearPeak`, regardless of wall-clock time.
#[test]
fn empty_calendar_always_outside_peak() {
    let now = dt(2024, 3, 1, 12, 0);
    let gateway = Arc::new(MockGateway::new(vec![]));
    let scheduler = make_scheduler(&[], now, 15, gateway);
    assert_eq!(scheduler.current_state(), State::OutsidePeak);
}

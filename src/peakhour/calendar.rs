use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use crate::clock::Clock;

use super::period::Period;
use super::time::{HourMinute, DAY_END, DAY_START};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("invalid peak hour range {0:?}: expected \"HH:MM-HH:MM\"")]
    InvalidRange(String),

    #[error("invalid time {0:?} in peak hour range: expected \"HH:MM\"")]
    InvalidTime(String),
}

/// An unordered, overlap-merged set of same-day [`Period`]s, built once from
/// configuration and immutable thereafter.
///
/// `spans_midnight` is true iff the set contains both a period ending at
/// `DAY_END` and one starting at `DAY_START` — the signature of a single
/// real interval that was split across the midnight seam at construction
/// time. Queries use this to avoid treating the seam as a true start/end.
#[derive(Clone)]
pub struct PeakCalendar {
    periods: Vec<Period>,
    spans_midnight: bool,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PeakCalendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeakCalendar")
            .field("periods", &self.periods)
            .field("spans_midnight", &self.spans_midnight)
            .finish()
    }
}

impl PeakCalendar {
    /// Parse zero or more `"HH:MM-HH:MM"` strings into a canonical,
    /// overlap-merged calendar. An empty slice yields a calendar with no
    /// periods, for which `is_peak_now` is always false.
    pub fn parse(ranges: &[String], clock: Arc<dyn Clock>) -> Result<Self, CalendarError> {
        let mut periods: Vec<Period> = Vec::new();

        for raw in ranges {
            let (start_str, end_str) = raw
                .split_once('-')
                .filter(|_| raw.matches('-').count() == 1)
                .ok_or_else(|| CalendarError::InvalidRange(raw.clone()))?;

            let start = parse_hhmm(start_str)?;
            let end = parse_hhmm(end_str)?;

            if start > end {
                merge_into(&mut periods, Period::new(start, DAY_END).unwrap());
                merge_into(&mut periods, Period::new(DAY_START, end).unwrap());
            } else {
                merge_into(&mut periods, Period::new(start, end).unwrap());
            }
        }

        let spans_midnight = periods.iter().any(|p| p.end == DAY_END)
            && periods.iter().any(|p| p.start == DAY_START);

        Ok(Self {
            periods,
            spans_midnight,
            clock,
        })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn spans_midnight(&self) -> bool {
        self.spans_midnight
    }

    pub fn has_periods(&self) -> bool {
        !self.periods.is_empty()
    }

    pub fn is_peak_now(&self) -> bool {
        self.is_peak_at(self.clock.now())
    }

    /// The next wall-clock instant at which the calendar's nearest peak
    /// period ends. Periods whose `end` is the `DAY_END` seam are skipped
    /// when `spans_midnight` — they are a continuation artifact of the
    /// midnight split, not a true end of peak.
    pub fn nearest_end_of_peak(&self) -> DateTime<Utc> {
        self.nearest_boundary_at(self.clock.now(), true)
    }

    /// Dual of [`Self::nearest_end_of_peak`]: the next wall-clock instant at
    /// which the nearest peak period starts, skipping `DAY_START` seams when
    /// `spans_midnight`.
    pub fn nearest_start_of_peak(&self) -> DateTime<Utc> {
        self.nearest_boundary_at(self.clock.now(), false)
    }

    fn is_peak_at(&self, now: DateTime<Utc>) -> bool {
        let hm = HourMinute::from_datetime(now);
        self.periods.iter().any(|p| p.contains(hm))
    }

    fn nearest_boundary_at(&self, now: DateTime<Utc>, end: bool) -> DateTime<Utc> {
        let hm = HourMinute::from_datetime(now);
        let seam = if end { DAY_END } else { DAY_START };

        let mut best: Option<(std::time::Duration, bool, HourMinute)> = None;
        for period in &self.periods {
            let boundary = if end { period.end } else { period.start };
            if self.spans_midnight && boundary == seam {
                continue;
            }

            let (duration, wrapped) = boundary.sub(hm);
            if best.is_none_or(|(best_d, ..)| duration < best_d) {
                best = Some((duration, wrapped, boundary));
            }
        }

        let (_, wrapped, boundary) = best.expect("calendar has at least one peak period");
        combine(now, boundary, wrapped)
    }
}

fn parse_hhmm(s: &str) -> Result<HourMinute, CalendarError> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| CalendarError::InvalidTime(s.to_string()))?;
    let hour: u8 = h.parse().map_err(|_| CalendarError::InvalidTime(s.to_string()))?;
    let minute: u8 = m.parse().map_err(|_| CalendarError::InvalidTime(s.to_string()))?;
    HourMinute::new(hour, minute).ok_or_else(|| CalendarError::InvalidTime(s.to_string()))
}

/// Merge `p` into the running set `periods`, replacing every period that
/// overlaps or touches `p` with a single union period.
fn merge_into(periods: &mut Vec<Period>, p: Period) {
    let mut merged = p;
    let mut disjoint = Vec::with_capacity(periods.len());

    for existing in periods.drain(..) {
        if existing.overlaps(&merged) {
            merged = merged.union(&existing);
        } else {
            disjoint.push(existing);
        }
    }

    disjoint.push(merged);
    *periods = disjoint;
}

fn combine(now: DateTime<Utc>, target: HourMinute, wrapped: bool) -> DateTime<Utc> {
    let mut date = now.date_naive();
    if wrapped {
        date += chrono::Duration::days(1);
    }
    let time = NaiveTime::from_hms_opt(u32::from(target.hour), u32::from(target.minute), 0)
        .expect("HourMinute is always a valid time of day");
    Utc.from_utc_datetime(&NaiveDateTime::new(date, time))
}

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};

/// A wall-clock time of day at minute resolution, total-ordered by
/// `(hour, minute)`. The controller never needs finer granularity than a
/// minute, so seconds and below are dropped at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourMinute {
    pub hour: u8,
    pub minute: u8,
}

/// `00:00`.
pub const DAY_START: HourMinute = HourMinute { hour: 0, minute: 0 };

/// `23:59`. Not midnight itself — the last representable minute of the day,
/// used as the far endpoint when a peak range is split across the midnight
/// seam.
pub const DAY_END: HourMinute = HourMinute {
    hour: 23,
    minute: 59,
};

impl HourMinute {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self { hour, minute })
    }

    pub fn from_datetime<Tz: chrono::TimeZone>(now: DateTime<Tz>) -> Self {
        Self {
            hour: now.hour() as u8,
            minute: now.minute() as u8,
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    fn minutes_since_midnight(self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }

    /// `self - other`, returning `(duration, wrapped)` where
    /// `duration = (self - other) mod 24h ∈ [0h, 24h)` and `wrapped` is true
    /// iff `self < other` (i.e. the subtraction had to cross midnight).
    pub fn sub(self, other: HourMinute) -> (Duration, bool) {
        let raw = self.minutes_since_midnight() - other.minutes_since_midnight();
        let wrapped = self < other;
        let minutes = raw.rem_euclid(24 * 60);
        (Duration::from_secs(minutes as u64 * 60), wrapped)
    }
}

impl fmt::Display for HourMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_hour_then_minute() {
        assert!(HourMinute::new(9, 0).unwrap() < HourMinute::new(9, 1).unwrap());
        assert!(HourMinute::new(8, 59).unwrap() < HourMinute::new(9, 0).unwrap());
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(HourMinute::new(24, 0).is_none());
        assert!(HourMinute::new(0, 60).is_none());
        assert!(HourMinute::new(23, 59).is_some());
    }

    #[test]
    fn subtract_same_value_is_zero_not_wrapped() {
        let t = HourMinute::new(10, 30).unwrap();
        let (d, wrapped) = t.sub(t);
        assert_eq!(d, Duration::ZERO);
        assert!(!wrapped);
    }

    #[test]
    fn subtract_wraps_when_lhs_smaller() {
        let a = HourMinute::new(1, 0).unwrap();
        let b = HourMinute::new(23, 0).unwrap();
        let (d, wrapped) = a.sub(b);
        assert_eq!(d, Duration::from_secs(2 * 3600));
        assert!(wrapped);
    }

    #[test]
    fn subtract_forward_no_wrap() {
        let a = HourMinute::new(15, 0).unwrap();
        let b = HourMinute::new(11, 0).unwrap();
        let (d, wrapped) = a.sub(b);
        assert_eq!(d, Duration::from_secs(4 * 3600));
        assert!(!wrapped);
    }

    proptest::proptest! {
        #[test]
        fn sub_duration_law(ah in 0u8..24, am in 0u8..60, bh in 0u8..24, bm in 0u8..60) {
            let a = HourMinute::new(ah, am).unwrap();
            let b = HourMinute::new(bh, bm).unwrap();
            let (d_ab, _) = a.sub(b);
            let (d_ba, _) = b.sub(a);
            let total = d_ab + d_ba;
            prop_assert!(total == Duration::ZERO || total == Duration::from_secs(24 * 3600));
        }

        #[test]
        fn sub_duration_in_range(ah in 0u8..24, am in 0u8..60, bh in 0u8..24, bm in 0u8..60) {
            let a = HourMinute::new(ah, am).unwrap();
            let b = HourMinute::new(bh, bm).unwrap();
            let (d, _) = a.sub(b);
            prop_assert!(d < Duration::from_secs(24 * 3600));
        }
    }
}

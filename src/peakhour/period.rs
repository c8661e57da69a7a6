use super::time::HourMinute;

/// A closed-open interval `[start, end)` within one calendar day.
///
/// Invariant: `start <= end`. A range that spans midnight is represented as
/// two `Period`s joined at the `DAY_END`/`DAY_START` seam rather than as one
/// `Period` with `start > end` — see [`super::calendar::PeakCalendar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub start: HourMinute,
    pub end: HourMinute,
}

impl Period {
    pub fn new(start: HourMinute, end: HourMinute) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self { start, end })
    }

    /// `t ∈ [start, end)`.
    pub fn contains(&self, t: HourMinute) -> bool {
        self.start <= t && t < self.end
    }

    /// Two periods overlap iff neither's start exceeds the other's end, nor
    /// vice versa. Contact at endpoints counts as overlap: `[10:00,12:00)`
    /// overlaps `[12:00,13:00)`.
    pub fn overlaps(&self, other: &Period) -> bool {
        !(self.start > other.end || other.start > self.end)
    }

    /// The smallest period containing both `self` and `other`.
    pub fn union(&self, other: &Period) -> Period {
        Period {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u8, m: u8) -> HourMinute {
        HourMinute::new(h, m).unwrap()
    }

    #[test]
    fn half_open_excludes_end() {
        let p = Period::new(hm(10, 0), hm(12, 0)).unwrap();
        assert!(p.contains(hm(10, 0)));
        assert!(p.contains(hm(11, 59)));
        assert!(!p.contains(hm(12, 0)));
    }

    #[test]
    fn touching_periods_overlap() {
        let a = Period::new(hm(10, 0), hm(12, 0)).unwrap();
        let b = Period::new(hm(12, 0), hm(13, 0)).unwrap();
        assert!(a.overlaps(&b));
        assert_eq!(a.union(&b), Period::new(hm(10, 0), hm(13, 0)).unwrap());
    }

    #[test]
    fn disjoint_periods_do_not_overlap() {
        let a = Period::new(hm(10, 0), hm(11, 0)).unwrap();
        let b = Period::new(hm(11, 1), hm(12, 0)).unwrap();
        assert!(!a.overlaps(&b));
    }

    #[test]
    fn rejects_inverted_range() {
        assert!(Period::new(hm(12, 0), hm(10, 0)).is_none());
    }
}

/// The scheduler's current state, recomputed from the calendar and the
/// clock at the top of every tick. It is never stored between ticks —
/// there is no persistent state variable and no explicit transition
/// action, only the state the next tick happens to compute.
///
/// ```text
/// InPeak       ─ peak ends ─────────→  OutsidePeak
/// OutsidePeak ─ within near-peak window → NearPeak
/// NearPeak    ─ peak begins ─────────→ InPeak
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// `is_peak_now()` holds. No drains happen in this state.
    InPeak,
    /// Not in peak, but the nearest peak start is within the near-peak
    /// window (`2 * graceful_period`).
    NearPeak,
    /// Neither of the above.
    OutsidePeak,
}

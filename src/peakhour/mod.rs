//! Peak-hour calendar: parses configured `HH:MM-HH:MM` ranges into a
//! canonical, overlap-merged set of same-day periods and answers "is now
//! peak?" / "when is the nearest peak boundary?".

mod calendar;
mod period;
mod time;

pub use calendar::{CalendarError, PeakCalendar};
pub use period::Period;
pub use time::{HourMinute, DAY_END, DAY_START};

use chrono::{Datelike, NaiveDate};

use crate::tracker::{Tracker, Weekday};

/// Maps a calendar date onto the domain weekday numbering (Monday = 1).
/// Every schedule comparison goes through this one remapping.
pub fn weekday_of(date: NaiveDate) -> Weekday {
    match date.weekday() {
        chrono::Weekday::Mon => Weekday::Mon,
        chrono::Weekday::Tue => Weekday::Tue,
        chrono::Weekday::Wed => Weekday::Wed,
        chrono::Weekday::Thu => Weekday::Thu,
        chrono::Weekday::Fri => Weekday::Fri,
        chrono::Weekday::Sat => Weekday::Sat,
        chrono::Weekday::Sun => Weekday::Sun,
    }
}

/// Whether `tracker` is actionable on `date`.
///
/// A recurring tracker is due on every date whose weekday is in its schedule.
/// An irregular tracker (empty schedule) is due on its creation day only.
pub fn is_due(tracker: &Tracker, date: NaiveDate) -> bool {
    if tracker.schedule.is_empty() {
        return date == tracker.created_at;
    }
    tracker.schedule.contains(&weekday_of(date))
}

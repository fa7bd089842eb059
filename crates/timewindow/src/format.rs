//! Human-readable rendering of instants.

use chrono::{DateTime, Datelike, TimeZone};
use chrono_tz::Tz;

/// English ordinal suffix for a day of the month: `1st`, `2nd`, `3rd`, `11th`, `21st`.
pub fn ordinal_suffix(day: u32) -> &'static str {
    if (4..=20).contains(&day) || (24..=30).contains(&day) {
        return "th";
    }
    match day % 10 {
        1 => "st",
        2 => "nd",
        3 => "rd",
        _ => "th",
    }
}

/// Render `instant` in `timezone` as `"Friday, March 1st, 2024 @ 2:05 PM"`.
///
/// The layout is fixed English, independent of locale.
pub fn format_datetime<T: TimeZone>(instant: &DateTime<T>, timezone: Tz) -> String {
    let local = instant.with_timezone(&timezone);
    let day = local.day();
    format!(
        "{}{}{}{}",
        local.format("%A, %B "),
        day,
        ordinal_suffix(day),
        local.format(", %Y @ %-I:%M %p")
    )
}

//! Free-text date interpretation.
//!
//! [`TimeWindow`](crate::window::TimeWindow) never reads free text itself: it
//! delegates to a [`DateParser`], which turns a string into a naive wall-clock
//! reading. [`PermissiveDateParser`] is the default grammar; callers with
//! stricter or locale-specific needs plug in their own implementation (any
//! `Fn(&str) -> Option<NaiveDateTime>` works).
//!
//! # Default grammar
//!
//! - ISO 8601 without offset: `"2024-03-05"`, `"2024-03-05 14:30"`,
//!   `"2024-03-05T14:30:15.250"`
//! - Numeric dates: `"2024/03/05"`, `"03/05/2024"` (month first), `"20240305"`
//! - Month names: `"March 5, 2024"`, `"5 Mar 2024"`, `"Tuesday, March 5th 2024"`,
//!   `"March 2024"` (day defaults to the 1st)
//! - Optional time anywhere in the text: `"2pm"`, `"2:30 pm"`, `"14:30"`,
//!   `"noon"`, `"midnight"`
//!
//! A year is always required. Text carrying a UTC offset is rejected: the
//! result must be a naive reading for the caller to localize.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Capability that interprets free text as a naive wall-clock reading.
pub trait DateParser {
    /// Return the wall-clock reading, or `None` if `text` cannot be interpreted.
    fn parse(&self, text: &str) -> Option<NaiveDateTime>;
}

impl<F> DateParser for F
where
    F: Fn(&str) -> Option<NaiveDateTime>,
{
    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        self(text)
    }
}

/// The default, forgiving date grammar (see the module docs).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermissiveDateParser;

impl DateParser for PermissiveDateParser {
    fn parse(&self, text: &str) -> Option<NaiveDateTime> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        try_iso_datetime(trimmed).or_else(|| try_tokens(&normalize_text(trimmed)))
    }
}

/// Date/time formats tried verbatim before tokenizing.
const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn try_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    ISO_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Lowercase, turn commas into spaces, collapse runs of whitespace.
fn normalize_text(s: &str) -> String {
    s.to_lowercase()
        .replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fields collected while scanning tokens.
#[derive(Debug, Default)]
struct Fields {
    date: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    time: Option<NaiveTime>,
}

/// Set `slot` once; a second value for the same field is ambiguous.
fn set_once<T>(slot: &mut Option<T>, value: T) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

fn try_tokens(s: &str) -> Option<NaiveDateTime> {
    let mut fields = Fields::default();

    for token in merge_meridiem(s.split(' ')) {
        let token = token.as_str();
        if matches!(token, "at" | "@" | "of" | "on" | "the") || parse_weekday(token).is_some() {
            continue;
        }
        if let Some(month) = parse_month(token) {
            set_once(&mut fields.month, month)?;
        } else if let Some(time) = named_time(token).or_else(|| parse_time_string(token)) {
            set_once(&mut fields.time, time)?;
        } else if let Some(date) = parse_numeric_date(token) {
            set_once(&mut fields.date, date)?;
        } else if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
            set_once(&mut fields.year, token.parse().ok()?)?;
        } else if let Some(day) = parse_day(token) {
            set_once(&mut fields.day, day)?;
        } else {
            return None;
        }
    }

    let date = match fields.date {
        Some(date) => {
            if fields.year.is_some() || fields.month.is_some() || fields.day.is_some() {
                return None;
            }
            date
        }
        None => NaiveDate::from_ymd_opt(fields.year?, fields.month?, fields.day.unwrap_or(1))?,
    };

    let time = match fields.time {
        Some(time) => time,
        None => NaiveTime::from_hms_opt(0, 0, 0)?,
    };
    Some(date.and_time(time))
}

/// Glue a standalone "am"/"pm" onto the preceding token ("2 pm" → "2pm").
fn merge_meridiem<'a>(tokens: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for token in tokens {
        if matches!(token, "am" | "pm" | "a.m." | "p.m.") {
            if let Some(prev) = merged.last_mut() {
                if prev.starts_with(|c: char| c.is_ascii_digit()) {
                    prev.push_str(&token.replace('.', ""));
                    continue;
                }
            }
        }
        merged.push(token.to_string());
    }
    merged
}

/// `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY`, `MM-DD-YYYY`, or `YYYYMMDD`.
fn parse_numeric_date(s: &str) -> Option<NaiveDate> {
    if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(s, "%Y%m%d").ok();
    }

    let sep = if s.contains('-') {
        '-'
    } else if s.contains('/') {
        '/'
    } else {
        return None;
    };
    let parts: Vec<&str> = s.split(sep).collect();
    if parts.len() != 3
        || parts
            .iter()
            .any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    let (y, m, d) = if parts[0].len() == 4 {
        (parts[0], parts[1], parts[2])
    } else if parts[2].len() == 4 {
        (parts[2], parts[0], parts[1])
    } else {
        return None;
    };

    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

/// A day of month, optionally with an English ordinal suffix ("5", "05", "5th").
fn parse_day(s: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| s.strip_suffix(suffix))
        .unwrap_or(s);
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = digits.parse().ok()?;
    (1..=31).contains(&day).then_some(day)
}

/// Parse a weekday name (full or abbreviated).
fn parse_weekday(s: &str) -> Option<Weekday> {
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Parse a month name to number (1-12).
fn parse_month(s: &str) -> Option<u32> {
    match s.trim_end_matches('.') {
        "january" | "jan" => Some(1),
        "february" | "feb" => Some(2),
        "march" | "mar" => Some(3),
        "april" | "apr" => Some(4),
        "may" => Some(5),
        "june" | "jun" => Some(6),
        "july" | "jul" => Some(7),
        "august" | "aug" => Some(8),
        "september" | "sep" | "sept" => Some(9),
        "october" | "oct" => Some(10),
        "november" | "nov" => Some(11),
        "december" | "dec" => Some(12),
        _ => None,
    }
}

fn named_time(s: &str) -> Option<NaiveTime> {
    match s {
        "noon" => NaiveTime::from_hms_opt(12, 0, 0),
        "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
        _ => None,
    }
}

/// Parse a time string: "2pm", "2:30pm", "14:00", "14:30:00".
fn parse_time_string(s: &str) -> Option<NaiveTime> {
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
        return Some(t);
    }

    let (time_part, is_pm) = if let Some(rest) = s.strip_suffix("pm") {
        (rest, true)
    } else if let Some(rest) = s.strip_suffix("am") {
        (rest, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = time_part.split(':').collect();
    let hour: u32 = parts.first()?.parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }
    let minute: u32 = match parts.get(1) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    let second: u32 = match parts.get(2) {
        Some(sec) => sec.parse().ok()?,
        None => 0,
    };

    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };

    NaiveTime::from_hms_opt(hour24, minute, second)
}

// ── Tests ───────────────────────────────────────────────────────────────────

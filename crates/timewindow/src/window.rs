//! Timezone-aware time windows built from untrusted request input.
//!
//! A [`TimeWindow`] owns the process timezone (injected once, at
//! construction) and the free-text [`DateParser`]. Every operation is a pure,
//! single-pass transform: raw strings or timestamps come in, and either a
//! validated value comes out or the whole call fails with one
//! [`TimeWindowError`].
//!
//! # Operations
//!
//! - [`TimeWindow::parse_start_and_end_date`] — two free-text dates → inclusive range
//! - [`TimeWindow::extract_times`] — `start`/`end` UNIX timestamps → range
//! - [`TimeWindow::extract_dates`] — `start`/`end` `YYYY-MM-DD` dates → range
//! - [`TimeWindow::get_month_timeframe`] — the whole calendar month around a date
//! - [`TimeWindow::month_list`] — month starts from an epoch through now, newest first
//! - [`TimeWindow::beginning_of_the_day`] / [`TimeWindow::end_of_the_day`]
//!
//! # Localization
//!
//! Naive wall-clock readings are attached to a timezone by [`localize_in`].
//! A reading repeated by a DST fall-back resolves to the later instant (the
//! standard-time reading); a reading skipped by a DST spring-forward does not
//! exist and is rejected. Starts of days and months always exist:
//! [`localize_start_in`] takes the first instant of the day, moving past a
//! gap when midnight itself is skipped.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::calendar::YearMonth;
use crate::error::{Result, TimeWindowError};
use crate::format;
use crate::params::ParameterSource;
use crate::parser::{DateParser, PermissiveDateParser};

// ── TimeRange ───────────────────────────────────────────────────────────────

/// A validated interval of aware instants.
///
/// # Invariants
/// `start <= end`. [`TimeRange::new`] is the only constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    start: DateTime<Tz>,
    end: DateTime<Tz>,
}

/// JSON-friendly view of a [`TimeRange`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SerializedRange {
    /// Start of the range (RFC 3339 with offset).
    pub start: String,
    /// End of the range (RFC 3339 with offset).
    pub end: String,
    /// The IANA timezone both endpoints are expressed in.
    pub timezone: String,
}

impl TimeRange {
    /// Build a range, failing with [`TimeWindowError::InvertedRange`] if `end < start`.
    pub fn new(start: DateTime<Tz>, end: DateTime<Tz>) -> Result<Self> {
        if end < start {
            return Err(TimeWindowError::InvertedRange);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Tz> {
        self.start
    }

    pub fn end(&self) -> DateTime<Tz> {
        self.end
    }

    /// Whether `instant` lies within the range, both ends inclusive.
    pub fn contains<T: TimeZone>(&self, instant: &DateTime<T>) -> bool {
        let instant = instant.with_timezone(&Utc);
        self.start.with_timezone(&Utc) <= instant && instant <= self.end.with_timezone(&Utc)
    }

    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }

    pub fn to_serialized(&self) -> SerializedRange {
        SerializedRange {
            start: self.start.to_rfc3339(),
            end: self.end.to_rfc3339(),
            timezone: self.start.timezone().name().to_string(),
        }
    }
}

// ── DayBoundary ─────────────────────────────────────────────────────────────

/// The start or end of a day, either as a bare wall-clock reading or localized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBoundary {
    Naive(NaiveDateTime),
    Local(DateTime<Tz>),
}

impl DayBoundary {
    /// The wall-clock reading, whichever form this boundary is in.
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            DayBoundary::Naive(naive) => *naive,
            DayBoundary::Local(local) => local.naive_local(),
        }
    }

    pub fn local(&self) -> Option<DateTime<Tz>> {
        match self {
            DayBoundary::Naive(_) => None,
            DayBoundary::Local(local) => Some(*local),
        }
    }
}

// ── Localization ────────────────────────────────────────────────────────────

/// Attach `tz` to a naive wall-clock reading.
///
/// # Errors
///
/// Returns [`TimeWindowError::InvalidDatetime`] if the reading falls in a DST
/// gap and so never occurs in `tz`.
pub fn localize_in(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(_, latest) => Ok(latest),
        LocalResult::None => Err(TimeWindowError::InvalidDatetime(format!(
            "'{naive}' does not exist in {}",
            tz.name()
        ))),
    }
}

/// Longest stretch of wall-clock time a DST or calendar change can skip.
const GAP_SEARCH_MINUTES: u32 = 2 * 24 * 60;

/// Attach `tz` to the start of a day or month, i.e. the first instant that
/// carries this wall-clock reading or follows it.
///
/// A reading repeated by a fall-back resolves to its earlier occurrence. A
/// reading inside a DST gap (zones that spring forward at midnight) moves to
/// the first wall-clock minute after the gap, so `2017-10-01 00:00` in
/// `America/Asuncion` becomes `01:00-03:00`.
pub fn localize_start_in(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>> {
    let missing = || {
        TimeWindowError::InvalidDatetime(format!(
            "no instant at or after '{naive}' in {}",
            tz.name()
        ))
    };

    let mut reading = naive;
    for _ in 0..GAP_SEARCH_MINUTES {
        let local = match tz.from_local_datetime(&reading) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => {
                reading = reading
                    .checked_add_signed(Duration::minutes(1))
                    .ok_or_else(missing)?;
                continue;
            }
        };
        if reading != naive {
            debug!(
                requested = %naive,
                resolved = %reading,
                timezone = tz.name(),
                "skipped DST gap"
            );
        }
        return Ok(local);
    }
    Err(missing())
}

/// Interpret a UNIX timestamp's UTC wall-clock reading as local time in `tz`.
///
/// The timestamp is assumed to already be expressed in local time, so only
/// its fields are kept. Sub-second precision is rounded to microseconds.
fn timestamp_to_local(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    let seconds: f64 = raw.trim().parse().ok()?;
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros.abs() >= i64::MAX as f64 {
        return None;
    }
    let micros = micros as i64;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    let utc = DateTime::from_timestamp(micros.div_euclid(1_000_000), nanos)?;
    localize_in(utc.naive_utc(), tz).ok()
}

fn required<'a, S>(parameters: &'a S, key: &str) -> Result<std::borrow::Cow<'a, str>>
where
    S: ParameterSource + ?Sized,
{
    parameters
        .lookup(key)
        .ok_or_else(|| TimeWindowError::MissingParameter(key.to_string()))
}

// ── TimeWindow ──────────────────────────────────────────────────────────────

/// Stateless time-window computations anchored to one process timezone.
#[derive(Debug, Clone)]
pub struct TimeWindow<P = PermissiveDateParser> {
    timezone: Tz,
    month_list_epoch: YearMonth,
    parser: P,
}

impl TimeWindow {
    /// A window in `timezone` using the default free-text grammar.
    pub fn new(timezone: Tz) -> Self {
        Self::with_parser(timezone, PermissiveDateParser)
    }
}

impl<P: DateParser> TimeWindow<P> {
    /// A window in `timezone` that interprets free text with `parser`.
    pub fn with_parser(timezone: Tz, parser: P) -> Self {
        Self {
            timezone,
            month_list_epoch: YearMonth::DEFAULT_EPOCH,
            parser,
        }
    }

    /// Replace the first month offered by [`TimeWindow::month_list`] when no start is given.
    pub fn with_month_list_epoch(mut self, epoch: YearMonth) -> Self {
        self.month_list_epoch = epoch;
        self
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn month_list_epoch(&self) -> YearMonth {
        self.month_list_epoch
    }

    /// Attach the process timezone to a naive reading. See [`localize_in`].
    pub fn localize(&self, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
        localize_in(naive, self.timezone)
    }

    /// Attach the process timezone to a day or month start. See [`localize_start_in`].
    pub fn localize_start(&self, naive: NaiveDateTime) -> Result<DateTime<Tz>> {
        localize_start_in(naive, self.timezone)
    }

    /// Localize every reading, failing on the first that cannot be localized.
    pub fn localize_all<I>(&self, naives: I) -> Result<Vec<DateTime<Tz>>>
    where
        I: IntoIterator<Item = NaiveDateTime>,
    {
        naives.into_iter().map(|n| self.localize(n)).collect()
    }

    /// The current wall clock in the process timezone, with the zone dropped.
    pub fn naive_local_now(&self) -> NaiveDateTime {
        self.naive_local_now_at(Utc::now())
    }

    pub fn naive_local_now_at(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }

    /// Render `instant` in the process timezone, e.g. `"Friday, March 1st, 2024 @ 2:05 PM"`.
    pub fn format_datetime<T: TimeZone>(&self, instant: &DateTime<T>) -> String {
        format::format_datetime(instant, self.timezone)
    }

    fn parse_text(&self, text: &str) -> Result<NaiveDateTime> {
        self.parser
            .parse(text)
            .ok_or_else(|| TimeWindowError::ParseFailure(text.trim().to_string()))
    }

    // ── parse_start_and_end_date ────────────────────────────────────────

    /// Parse two free-text dates into a range whose end covers its whole day.
    ///
    /// The end reading is pushed forward by one day less one microsecond, so
    /// `"2024-03-05"` ends at `2024-03-05 23:59:59.999999`.
    ///
    /// # Errors
    ///
    /// [`TimeWindowError::ParseFailure`] if either text cannot be interpreted,
    /// [`TimeWindowError::InvalidDatetime`] if a reading cannot be localized,
    /// [`TimeWindowError::InvertedRange`] if the adjusted end precedes the start.
    pub fn parse_start_and_end_date(&self, start: &str, end: &str) -> Result<TimeRange> {
        let start_naive = self.parse_text(start)?;
        let end_naive = self
            .parse_text(end)?
            .checked_add_signed(Duration::days(1) - Duration::microseconds(1))
            .ok_or_else(|| {
                TimeWindowError::InvalidDatetime(format!("'{}' is out of range", end.trim()))
            })?;

        let range = TimeRange::new(self.localize(start_naive)?, self.localize(end_naive)?)?;
        debug!(start = %range.start, end = %range.end, "parsed free-text range");
        Ok(range)
    }

    // ── extract_times ───────────────────────────────────────────────────

    /// Extract `start` and `end` UNIX timestamps from request parameters.
    ///
    /// Each timestamp's wall-clock reading is taken as local time in
    /// `input_timezone`, or the process timezone when `None`.
    ///
    /// # Errors
    ///
    /// Checked in order: [`TimeWindowError::MissingParameter`] for an absent
    /// key, [`TimeWindowError::InvalidParameter`] for a value that is not a
    /// finite number or cannot be localized, then
    /// [`TimeWindowError::InvertedRange`].
    pub fn extract_times<S>(
        &self,
        parameters: &S,
        input_timezone: Option<Tz>,
    ) -> Result<TimeRange>
    where
        S: ParameterSource + ?Sized,
    {
        let tz = input_timezone.unwrap_or(self.timezone);
        let start = required(parameters, "start")?;
        let end = required(parameters, "end")?;

        let start = timestamp_to_local(&start, tz)
            .ok_or_else(|| TimeWindowError::InvalidParameter("start".to_string()))?;
        let end = timestamp_to_local(&end, tz)
            .ok_or_else(|| TimeWindowError::InvalidParameter("end".to_string()))?;

        let range = TimeRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "extracted timestamp range");
        Ok(range)
    }

    // ── extract_dates ───────────────────────────────────────────────────

    /// Parse a `YYYY-MM-DD` date as the first local instant of that day.
    pub fn extract_date(&self, date: &str) -> Result<DateTime<Tz>> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| TimeWindowError::ParseFailure(date.to_string()))?;
        let midnight = day
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimeWindowError::InvalidDatetime(format!("no midnight on '{date}'")))?;
        self.localize_start(midnight)
    }

    /// Extract `start` and `end` calendar dates (`YYYY-MM-DD`) from request parameters.
    ///
    /// Both endpoints land on local midnight. Failures follow
    /// [`TimeWindow::extract_times`].
    pub fn extract_dates<S>(&self, parameters: &S) -> Result<TimeRange>
    where
        S: ParameterSource + ?Sized,
    {
        let start = required(parameters, "start")?;
        let end = required(parameters, "end")?;

        let start = self
            .extract_date(&start)
            .map_err(|_| TimeWindowError::InvalidParameter("start".to_string()))?;
        let end = self
            .extract_date(&end)
            .map_err(|_| TimeWindowError::InvalidParameter("end".to_string()))?;

        let range = TimeRange::new(start, end)?;
        debug!(start = %range.start, end = %range.end, "extracted date range");
        Ok(range)
    }

    // ── get_month_timeframe ─────────────────────────────────────────────

    /// The calendar month containing `date` (or the current local month when
    /// `date` is absent or blank), from `00:00:00` on the 1st to `23:59:59`
    /// on the last day.
    pub fn get_month_timeframe(&self, date: Option<&str>) -> Result<TimeRange> {
        self.get_month_timeframe_at(date, Utc::now())
    }

    pub fn get_month_timeframe_at(
        &self,
        date: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<TimeRange> {
        let month = match date.filter(|d| !d.trim().is_empty()) {
            Some(text) => YearMonth::of(&self.parse_text(text)?),
            None => YearMonth::of(&now.with_timezone(&self.timezone)),
        };
        let out_of_range =
            || TimeWindowError::InvalidDatetime(format!("month {month} is out of range"));

        let first = month
            .first_day()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(out_of_range)?;
        let last = month
            .last_day()
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .ok_or_else(out_of_range)?;

        TimeRange::new(self.localize_start(first)?, self.localize(last)?)
    }

    // ── month_list ──────────────────────────────────────────────────────

    /// Local midnight on the 1st of every month from `since` (default: the
    /// configured epoch) through the current local month, newest first.
    pub fn month_list(&self, since: Option<YearMonth>) -> Result<Vec<DateTime<Tz>>> {
        self.month_list_at(since, Utc::now())
    }

    /// [`TimeWindow::month_list`] with an explicit "now". Empty if `since` is in the future.
    pub fn month_list_at(
        &self,
        since: Option<YearMonth>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Tz>>> {
        let since = since.unwrap_or(self.month_list_epoch);
        let current = YearMonth::of(&now.with_timezone(&self.timezone));
        let count = since.months_until(current) + 1;
        if count <= 0 {
            return Ok(Vec::new());
        }
        let count = u32::try_from(count).map_err(|_| {
            TimeWindowError::InvalidDatetime(format!("too many months since {since}"))
        })?;

        (0..count)
            .rev()
            .map(|offset| {
                let month = since.add_months(offset);
                let midnight = month
                    .and_then(YearMonth::first_day)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .ok_or_else(|| {
                        TimeWindowError::InvalidDatetime(format!(
                            "{offset} months after {since} is out of range"
                        ))
                    })?;
                self.localize_start(midnight)
            })
            .collect()
    }

    // ── Day boundaries ──────────────────────────────────────────────────

    /// `00:00:00.000000` on the day of the wall-clock reading `t`, localized
    /// to the process timezone when `in_local_timezone` is set. A localized
    /// start that falls in a DST gap moves to the first instant after it.
    pub fn beginning_of_the_day(
        &self,
        t: NaiveDateTime,
        in_local_timezone: bool,
    ) -> Result<DayBoundary> {
        let midnight = t
            .date()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TimeWindowError::InvalidDatetime(format!("no midnight for '{t}'")))?;
        if in_local_timezone {
            self.localize_start(midnight).map(DayBoundary::Local)
        } else {
            Ok(DayBoundary::Naive(midnight))
        }
    }

    /// `23:59:59.999999` on the day of the wall-clock reading `t`, localized
    /// to the process timezone when `in_local_timezone` is set.
    pub fn end_of_the_day(
        &self,
        t: NaiveDateTime,
        in_local_timezone: bool,
    ) -> Result<DayBoundary> {
        let last_tick = t
            .date()
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| TimeWindowError::InvalidDatetime(format!("no end of day for '{t}'")))?;
        if in_local_timezone {
            self.localize(last_tick).map(DayBoundary::Local)
        } else {
            Ok(DayBoundary::Naive(last_tick))
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use chrono_tz::America::{Asuncion, Havana, New_York};
    use chrono_tz::Asia::Tokyo;
    use serde_json::json;
    use std::collections::HashMap;

    fn window() -> TimeWindow {
        TimeWindow::new(New_York)
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    // ── localize ────────────────────────────────────────────────────────

    #[test]
    fn test_localize_keeps_wall_clock() {
        let local = window().localize(naive(2024, 7, 4, 9, 30, 0)).unwrap();
        assert_eq!(local.naive_local(), naive(2024, 7, 4, 9, 30, 0));
        assert_eq!(local.to_rfc3339(), "2024-07-04T09:30:00-04:00");
    }

    #[test]
    fn test_localize_ambiguous_picks_standard_time() {
        // November 3, 2024: 01:30 happens twice in New York
        let local = window().localize(naive(2024, 11, 3, 1, 30, 0)).unwrap();
        assert_eq!(local.to_rfc3339(), "2024-11-03T01:30:00-05:00");
    }

    #[test]
    fn test_localize_gap_is_error() {
        // March 10, 2024: 02:00 jumps to 03:00 in New York
        let err = window().localize(naive(2024, 3, 10, 2, 30, 0)).unwrap_err();
        assert!(matches!(err, TimeWindowError::InvalidDatetime(_)));
        assert!(err.to_string().contains("America/New_York"), "got: {err}");
    }

    #[test]
    fn test_localize_start_skips_midnight_gap() {
        // October 1, 2017: Asuncion jumps from 00:00 to 01:00
        let start = localize_start_in(naive(2017, 10, 1, 0, 0, 0), Asuncion).unwrap();
        assert_eq!(start.to_rfc3339(), "2017-10-01T01:00:00-03:00");
        assert!(localize_in(naive(2017, 10, 1, 0, 0, 0), Asuncion).is_err());
    }

    #[test]
    fn test_localize_start_skips_whole_day() {
        // Samoa skipped December 30, 2011 entirely
        let start =
            localize_start_in(naive(2011, 12, 30, 0, 0, 0), chrono_tz::Pacific::Apia).unwrap();
        assert_eq!(start.to_rfc3339(), "2011-12-31T00:00:00+14:00");
    }

    #[test]
    fn test_localize_start_repeated_midnight_takes_first() {
        // November 3, 2024: Havana falls back from 01:00 to 00:00
        let start = localize_start_in(naive(2024, 11, 3, 0, 0, 0), Havana).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-11-03T00:00:00-04:00");
    }

    #[test]
    fn test_localize_start_plain_reading_unchanged() {
        let start = window().localize_start(naive(2024, 7, 1, 0, 0, 0)).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-07-01T00:00:00-04:00");
    }

    #[test]
    fn test_localize_all_fails_on_first_gap() {
        let result = window().localize_all(vec![
            naive(2024, 3, 9, 2, 30, 0),
            naive(2024, 3, 10, 2, 30, 0),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_naive_local_now_at() {
        let now = utc(2024, 3, 1, 3, 0, 0);
        assert_eq!(window().naive_local_now_at(now), naive(2024, 2, 29, 22, 0, 0));
    }

    // ── TimeRange ───────────────────────────────────────────────────────

    #[test]
    fn test_range_rejects_inverted() {
        let w = window();
        let a = w.localize(naive(2024, 1, 2, 0, 0, 0)).unwrap();
        let b = w.localize(naive(2024, 1, 1, 0, 0, 0)).unwrap();
        assert_eq!(TimeRange::new(a, b), Err(TimeWindowError::InvertedRange));
    }

    #[test]
    fn test_range_allows_empty() {
        let w = window();
        let a = w.localize(naive(2024, 1, 1, 0, 0, 0)).unwrap();
        let range = TimeRange::new(a, a).unwrap();
        assert_eq!(range.duration(), Duration::zero());
        assert!(range.contains(&a));
    }

    #[test]
    fn test_range_contains_other_timezone() {
        let p = params(&[("start", "2024-03-01"), ("end", "2024-03-02")]);
        let range = window().extract_dates(&p).unwrap();
        assert!(range.contains(&utc(2024, 3, 1, 12, 0, 0)));
        // 2024-03-01 04:00 UTC is 2024-02-29 23:00 in New York
        assert!(!range.contains(&utc(2024, 3, 1, 4, 0, 0)));
    }

    #[test]
    fn test_range_serialized() {
        let p = params(&[("start", "2024-03-01"), ("end", "2024-03-02")]);
        let range = window().extract_dates(&p).unwrap();
        let view = range.to_serialized();
        assert_eq!(view.start, "2024-03-01T00:00:00-05:00");
        assert_eq!(view.end, "2024-03-02T00:00:00-05:00");
        assert_eq!(view.timezone, "America/New_York");
    }

    // ── parse_start_and_end_date ────────────────────────────────────────

    #[test]
    fn test_free_text_end_covers_whole_day() {
        let range = window().parse_start_and_end_date("2024-03-01", "March 5, 2024").unwrap();
        assert_eq!(range.start().naive_local(), naive(2024, 3, 1, 0, 0, 0));
        let end = range.end();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));
        assert_eq!(end.nanosecond(), 999_999_000);
    }

    #[test]
    fn test_free_text_same_day() {
        let range = window().parse_start_and_end_date("2024-03-01", "2024-03-01").unwrap();
        assert!(range.start() < range.end());
    }

    #[test]
    fn test_free_text_inverted_is_error() {
        let err = window()
            .parse_start_and_end_date("2024-03-05", "2024-03-01")
            .unwrap_err();
        assert_eq!(err, TimeWindowError::InvertedRange);
    }

    #[test]
    fn test_free_text_unparseable() {
        let err = window()
            .parse_start_and_end_date("2024-03-01", " someday ")
            .unwrap_err();
        assert_eq!(err, TimeWindowError::ParseFailure("someday".to_string()));
    }

    #[test]
    fn test_free_text_custom_parser() {
        let fixed = |s: &str| match s {
            "start" => Some(naive(2024, 1, 1, 0, 0, 0)),
            "end" => Some(naive(2024, 1, 2, 0, 0, 0)),
            _ => None,
        };
        let w = TimeWindow::with_parser(Tokyo, fixed);
        let range = w.parse_start_and_end_date("start", "end").unwrap();
        assert_eq!(range.start().to_rfc3339(), "2024-01-01T00:00:00+09:00");
        assert_eq!(range.end().date_naive(), NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    // ── extract_times ───────────────────────────────────────────────────

    #[test]
    fn test_extract_times_valid() {
        let p = params(&[("start", "1709251200"), ("end", "1709337599")]);
        let range = window().extract_times(&p, None).unwrap();
        // Timestamps carry local wall-clock readings
        assert_eq!(range.start().to_rfc3339(), "2024-03-01T00:00:00-05:00");
        assert_eq!(range.end().naive_local(), naive(2024, 3, 1, 23, 59, 59));
    }

    #[test]
    fn test_extract_times_explicit_timezone() {
        let p = params(&[("start", "1709251200"), ("end", "1709337599")]);
        let range = window().extract_times(&p, Some(Tokyo)).unwrap();
        assert_eq!(range.start().to_rfc3339(), "2024-03-01T00:00:00+09:00");
        assert_eq!(range.end().to_rfc3339(), "2024-03-01T23:59:59+09:00");
    }

    #[test]
    fn test_extract_times_fractional_seconds() {
        let p = params(&[("start", "1709251200.5"), ("end", " 1709251201 ")]);
        let range = window().extract_times(&p, None).unwrap();
        assert_eq!(range.start().nanosecond(), 500_000_000);
    }

    #[test]
    fn test_extract_times_json_numbers() {
        let p = json!({ "start": 1709251200, "end": 1709337599.0 });
        let range = window().extract_times(&p, None).unwrap();
        assert_eq!(range.end().naive_local(), naive(2024, 3, 1, 23, 59, 59));
    }

    #[test]
    fn test_extract_times_equal_endpoints() {
        let p = params(&[("start", "1709251200"), ("end", "1709251200")]);
        let range = window().extract_times(&p, None).unwrap();
        assert_eq!(range.start(), range.end());
    }

    #[test]
    fn test_extract_times_inverted() {
        let p = params(&[("start", "1709337599"), ("end", "1709251200")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::InvertedRange)
        );
    }

    #[test]
    fn test_extract_times_missing_start() {
        let p = params(&[("end", "1709251200")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::MissingParameter("start".to_string()))
        );
    }

    #[test]
    fn test_extract_times_missing_end() {
        let p = params(&[("start", "1709251200")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::MissingParameter("end".to_string()))
        );
    }

    #[test]
    fn test_extract_times_presence_checked_before_validity() {
        let p = params(&[("start", "abc")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::MissingParameter("end".to_string()))
        );
    }

    #[test]
    fn test_extract_times_invalid_values() {
        for bad in ["abc", "", "nan", "inf", "1e300"] {
            let p = params(&[("start", bad), ("end", "1709251200")]);
            assert_eq!(
                window().extract_times(&p, None),
                Err(TimeWindowError::InvalidParameter("start".to_string())),
                "input: {bad:?}"
            );
        }
        let p = params(&[("start", "1709251200"), ("end", "later")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::InvalidParameter("end".to_string()))
        );
    }

    #[test]
    fn test_extract_times_unlocalizable_is_invalid() {
        // 2024-03-10 02:30 does not exist in New York
        let p = params(&[("start", "1710037800"), ("end", "1710129600")]);
        assert_eq!(
            window().extract_times(&p, None),
            Err(TimeWindowError::InvalidParameter("start".to_string()))
        );
    }

    // ── extract_dates ───────────────────────────────────────────────────

    #[test]
    fn test_extract_date_midnight() {
        let d = window().extract_date("2024-07-04").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-07-04T00:00:00-04:00");
    }

    #[test]
    fn test_extract_date_midnight_dst_start() {
        let start = TimeWindow::new(Asuncion).extract_date("2017-10-01").unwrap();
        assert_eq!(start.to_rfc3339(), "2017-10-01T01:00:00-03:00");
    }

    #[test]
    fn test_extract_date_strict_format() {
        assert!(matches!(
            window().extract_date("07/04/2024"),
            Err(TimeWindowError::ParseFailure(_))
        ));
    }

    #[test]
    fn test_extract_dates_valid() {
        let p = params(&[("start", "2024-03-01"), ("end", "2024-03-31")]);
        let range = window().extract_dates(&p).unwrap();
        assert_eq!(range.start().naive_local(), naive(2024, 3, 1, 0, 0, 0));
        assert_eq!(range.end().naive_local(), naive(2024, 3, 31, 0, 0, 0));
    }

    #[test]
    fn test_extract_dates_inverted() {
        let p = params(&[("start", "2024-03-31"), ("end", "2024-03-01")]);
        assert_eq!(window().extract_dates(&p), Err(TimeWindowError::InvertedRange));
    }

    #[test]
    fn test_extract_dates_missing() {
        let p = params(&[("start", "2024-03-01")]);
        assert_eq!(
            window().extract_dates(&p),
            Err(TimeWindowError::MissingParameter("end".to_string()))
        );
    }

    #[test]
    fn test_extract_dates_invalid() {
        let p = params(&[("start", "2024-13-01"), ("end", "2024-03-01")]);
        assert_eq!(
            window().extract_dates(&p),
            Err(TimeWindowError::InvalidParameter("start".to_string()))
        );
        let p = params(&[("start", "2024-03-01"), ("end", "March 2")]);
        assert_eq!(
            window().extract_dates(&p),
            Err(TimeWindowError::InvalidParameter("end".to_string()))
        );
    }

    // ── get_month_timeframe ─────────────────────────────────────────────

    #[test]
    fn test_month_timeframe_leap_february() {
        let range = window().get_month_timeframe(Some("2024-02-10")).unwrap();
        assert_eq!(range.start().naive_local(), naive(2024, 2, 1, 0, 0, 0));
        assert_eq!(range.end().naive_local(), naive(2024, 2, 29, 23, 59, 59));
    }

    #[test]
    fn test_month_timeframe_common_february() {
        let range = window().get_month_timeframe(Some("2023-02-10")).unwrap();
        assert_eq!(range.end().naive_local(), naive(2023, 2, 28, 23, 59, 59));
    }

    #[test]
    fn test_month_timeframe_december() {
        let range = window().get_month_timeframe(Some("December 25, 2024")).unwrap();
        assert_eq!(range.start().naive_local(), naive(2024, 12, 1, 0, 0, 0));
        assert_eq!(range.end().naive_local(), naive(2024, 12, 31, 23, 59, 59));
    }

    #[test]
    fn test_month_timeframe_midnight_dst_start() {
        let range = TimeWindow::new(Asuncion)
            .get_month_timeframe(Some("2017-10-15"))
            .unwrap();
        assert_eq!(range.start().to_rfc3339(), "2017-10-01T01:00:00-03:00");
        assert_eq!(range.end().to_rfc3339(), "2017-10-31T23:59:59-03:00");
    }

    #[test]
    fn test_month_timeframe_defaults_to_local_now() {
        // 02:00 UTC on April 1 is still March 31 in New York
        let now = utc(2024, 4, 1, 2, 0, 0);
        let range = window().get_month_timeframe_at(None, now).unwrap();
        assert_eq!(range.start().month(), 3);
        assert_eq!(range.end().naive_local(), naive(2024, 3, 31, 23, 59, 59));
    }

    #[test]
    fn test_month_timeframe_blank_is_now() {
        let now = utc(2024, 6, 15, 12, 0, 0);
        let range = window().get_month_timeframe_at(Some("  "), now).unwrap();
        assert_eq!(range.start().naive_local(), naive(2024, 6, 1, 0, 0, 0));
    }

    #[test]
    fn test_month_timeframe_unparseable() {
        assert!(matches!(
            window().get_month_timeframe(Some("whenever")),
            Err(TimeWindowError::ParseFailure(_))
        ));
    }

    // ── month_list ──────────────────────────────────────────────────────

    #[test]
    fn test_month_list_from_default_epoch() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let months = window().month_list_at(None, now).unwrap();
        assert_eq!(months.len(), 125);
        assert_eq!(months[0].naive_local(), naive(2024, 3, 1, 0, 0, 0));
        assert_eq!(months[124].naive_local(), naive(2013, 11, 1, 0, 0, 0));
    }

    #[test]
    fn test_month_list_across_midnight_dst_start() {
        let w = TimeWindow::new(Asuncion);
        let now = utc(2017, 11, 15, 12, 0, 0);
        let since = YearMonth::new(2017, 9).unwrap();
        let months: Vec<String> = w
            .month_list_at(Some(since), now)
            .unwrap()
            .iter()
            .map(|m| m.to_rfc3339())
            .collect();
        assert_eq!(
            months,
            vec![
                "2017-11-01T00:00:00-03:00",
                "2017-10-01T01:00:00-03:00",
                "2017-09-01T00:00:00-04:00",
            ]
        );
    }

    #[test]
    fn test_month_list_from_default_epoch_in_asuncion() {
        let w = TimeWindow::new(Asuncion);
        let months = w.month_list_at(None, utc(2024, 3, 15, 12, 0, 0)).unwrap();
        assert_eq!(months.len(), 125);
        assert_eq!(months[5].to_rfc3339(), "2023-10-01T01:00:00-03:00");
    }

    #[test]
    fn test_month_list_is_newest_first_with_monthly_stride() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let since = YearMonth::new(2023, 11).unwrap();
        let months = window().month_list_at(Some(since), now).unwrap();
        let labels: Vec<String> = months
            .iter()
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .collect();
        assert_eq!(
            labels,
            vec![
                "2024-03-01 00:00",
                "2024-02-01 00:00",
                "2024-01-01 00:00",
                "2023-12-01 00:00",
                "2023-11-01 00:00",
            ]
        );
    }

    #[test]
    fn test_month_list_current_month_only() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let since = YearMonth::new(2024, 3).unwrap();
        assert_eq!(window().month_list_at(Some(since), now).unwrap().len(), 1);
    }

    #[test]
    fn test_month_list_future_since_is_empty() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let since = YearMonth::new(2024, 4).unwrap();
        assert!(window().month_list_at(Some(since), now).unwrap().is_empty());
    }

    #[test]
    fn test_month_list_configured_epoch() {
        let now = utc(2024, 3, 15, 12, 0, 0);
        let w = window().with_month_list_epoch(YearMonth::new(2024, 1).unwrap());
        assert_eq!(w.month_list_at(None, now).unwrap().len(), 3);
    }

    #[test]
    fn test_month_list_uses_local_current_month() {
        // 03:00 UTC on March 1 is still February in New York
        let now = utc(2024, 3, 1, 3, 0, 0);
        let since = YearMonth::new(2024, 1).unwrap();
        let months = window().month_list_at(Some(since), now).unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month(), 2);
    }

    // ── Day boundaries ──────────────────────────────────────────────────

    #[test]
    fn test_beginning_of_the_day_local() {
        let b = window()
            .beginning_of_the_day(naive(2024, 7, 4, 15, 45, 12), true)
            .unwrap();
        assert_eq!(b.local().unwrap().to_rfc3339(), "2024-07-04T00:00:00-04:00");
    }

    #[test]
    fn test_beginning_of_the_day_midnight_dst_start() {
        let w = TimeWindow::new(Asuncion);
        let local = w.beginning_of_the_day(naive(2017, 10, 1, 12, 0, 0), true).unwrap();
        assert_eq!(local.local().unwrap().to_rfc3339(), "2017-10-01T01:00:00-03:00");
        let bare = w.beginning_of_the_day(naive(2017, 10, 1, 12, 0, 0), false).unwrap();
        assert_eq!(bare, DayBoundary::Naive(naive(2017, 10, 1, 0, 0, 0)));
    }

    #[test]
    fn test_beginning_of_the_day_naive() {
        let b = window()
            .beginning_of_the_day(naive(2024, 7, 4, 15, 45, 12), false)
            .unwrap();
        assert_eq!(b, DayBoundary::Naive(naive(2024, 7, 4, 0, 0, 0)));
        assert_eq!(b.local(), None);
    }

    #[test]
    fn test_end_of_the_day() {
        let b = window()
            .end_of_the_day(naive(2024, 7, 4, 3, 0, 0), true)
            .unwrap();
        let local = b.local().unwrap();
        assert_eq!((local.hour(), local.minute(), local.second()), (23, 59, 59));
        assert_eq!(local.nanosecond(), 999_999_000);
        assert_eq!(b.naive().date(), NaiveDate::from_ymd_opt(2024, 7, 4).unwrap());
    }

    #[test]
    fn test_end_of_the_day_idempotent() {
        let w = window();
        let once = w.end_of_the_day(naive(2024, 7, 4, 3, 0, 0), false).unwrap();
        let twice = w.end_of_the_day(once.naive(), false).unwrap();
        assert_eq!(once, twice);
    }

    // ── format_datetime ─────────────────────────────────────────────────

    #[test]
    fn test_format_datetime_in_process_timezone() {
        assert_eq!(
            window().format_datetime(&utc(2024, 3, 1, 19, 5, 0)),
            "Friday, March 1st, 2024 @ 2:05 PM"
        );
    }
}

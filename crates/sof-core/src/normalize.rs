//! Temporal normalization of date and time fragments.
//!
//! Turns the fuzzy fragments of a [`RawEvent`] into [`TimePoint`]s:
//!
//! 1. Clock times embedded in the date fragment ("2020-Aug-22 14:50-15:00",
//!    ISO strings) are split off and used when no dedicated time fragment
//!    exists.
//! 2. The date is read from its tokens. Without a 4-digit year the configured
//!    default year is used; day-first order applies to numeric dates.
//! 3. Times are combined with the date. A missing time leaves the start as a
//!    date-only point and the end unresolved.
//! 4. An end earlier than its start on the same nominal day is moved forward
//!    by 24 hours.
//!
//! Nothing in here fails: unparseable input becomes [`TimePoint::Unresolved`].

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::event::{NormalizedEvent, RawEvent, TimePoint};

/// Event-name keywords that mark an event as counting toward laytime when the
/// extractor gave no explicit hint.
pub const DEFAULT_LAYTIME_KEYWORDS: &[&str] = &[
    "preparing",
    "commenced",
    "completed",
    "loading",
    "discharge",
    "discharging",
    "cargo",
    "operation",
];

/// Matches `HH:MM`, `HH:MM:SS` and an optional meridiem inside free text.
static EMBEDDED_CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,2}:\d{2}(?::\d{2})?(?:\s*[ap]\.?m\b\.?)?").unwrap()
});

/// A whole ISO 8601 timestamp; fractional seconds and the UTC offset are
/// dropped so the wall-clock reading is kept.
static ISO_TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4}-\d{2}-\d{2})[Tt](\d{2}:\d{2}(?::\d{2})?)(?:\.\d+)?(?:[Zz]|[+-]\d{2}:?\d{2})?$",
    )
    .unwrap()
});

/// Four digits that are either a year or a compact `HHMM` clock.
static FOUR_DIGIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{4})(?:\s*(?:hrs?|lt|h))?\b").unwrap());

/// ISO date/time separator between two digits.
static ISO_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)[Tt](\d)").unwrap());

/// A single clock reading: `08:00`, `0800`, `8.00`, `08h00`, `2pm`, `1450hrs`.
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2})(?:[:.h]?(\d{2}))?(?::(\d{2}))?(?:\s*([ap])\.?m\.?)?(?:\s*(?:hrs?|lt|h))?$",
    )
    .unwrap()
});

/// Two clock readings separated by a dash or "to".
static CLOCK_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s*(?:-|–|\bto\b)\s*(.+)$").unwrap());

static ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})(?:st|nd|rd|th)$").unwrap());

/// Four-digit tokens outside this range are never read as a year.
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1900..=2100;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

/// Configuration for temporal normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Year used for fragments that carry only a day and month.
    pub default_year: i32,

    /// Lower-case keywords that mark an event as laytime when no hint exists.
    pub laytime_keywords: Vec<String>,
}

impl NormalizeConfig {
    /// Creates a config with the default laytime keywords.
    pub fn new(default_year: i32) -> Self {
        Self {
            default_year,
            laytime_keywords: DEFAULT_LAYTIME_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// A parsed clock reading.
///
/// `24:00` is kept apart from `00:00` because it denotes the end of the
/// nominal day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTime {
    At(NaiveTime),
    EndOfDay,
}

impl ClockTime {
    /// Places this reading on a calendar date.
    pub fn on(self, date: NaiveDate) -> NaiveDateTime {
        match self {
            Self::At(time) => date.and_time(time),
            Self::EndOfDay => date.and_time(NaiveTime::MIN) + Duration::days(1),
        }
    }
}

/// Normalizes a batch of candidates, preserving input order.
pub fn normalize_events(raw: &[RawEvent], config: &NormalizeConfig) -> Vec<NormalizedEvent> {
    raw.iter().map(|event| normalize_event(event, config)).collect()
}

/// Normalizes a single candidate.
pub fn normalize_event(raw: &RawEvent, config: &NormalizeConfig) -> NormalizedEvent {
    let (start_instant, end_instant) = resolve_endpoints(
        raw.date_fragment.as_deref(),
        raw.start_fragment.as_deref(),
        raw.end_fragment.as_deref(),
        config.default_year,
    );

    if !start_instant.is_resolved() {
        tracing::debug!(
            document = %raw.document_id,
            event = %raw.event_name,
            date = ?raw.date_fragment,
            start = ?raw.start_fragment,
            "unresolved event time"
        );
    }

    let counts_as_laytime = raw
        .laytime_hint
        .unwrap_or_else(|| is_laytime_event(&raw.event_name, &config.laytime_keywords));

    NormalizedEvent {
        document_id: raw.document_id.clone(),
        event_name: raw.event_name.trim().to_string(),
        start_instant,
        end_instant,
        counts_as_laytime,
        raw_line: raw.raw_line.trim().to_string(),
    }
}

/// Returns true if the event name contains any laytime keyword.
pub fn is_laytime_event(event_name: &str, keywords: &[String]) -> bool {
    let name = event_name.to_lowercase();
    keywords
        .iter()
        .filter(|keyword| !keyword.is_empty())
        .any(|keyword| name.contains(keyword.as_str()))
}

/// Resolves the start and end points of one event.
///
/// The start falls back to a date-only point when its time is missing; the
/// end stays unresolved. An end that precedes the start is rolled over to
/// the following day.
pub fn resolve_endpoints(
    date_fragment: Option<&str>,
    start_fragment: Option<&str>,
    end_fragment: Option<&str>,
    default_year: i32,
) -> (TimePoint, TimePoint) {
    let (date_text, embedded) = meaningful(date_fragment)
        .map(split_embedded_times)
        .unwrap_or_default();

    let mut start_text = meaningful(start_fragment).or_else(|| embedded.first().map(String::as_str));
    let mut end_text = meaningful(end_fragment).or_else(|| embedded.get(1).map(String::as_str));

    if end_text.is_none() {
        if let Some((from, to)) = start_text.and_then(split_clock_range) {
            start_text = Some(from);
            end_text = Some(to);
        }
    }

    let Some(date) = date_text.as_deref().and_then(|text| resolve_date(text, default_year)) else {
        return (TimePoint::Unresolved, TimePoint::Unresolved);
    };

    let start = start_text
        .and_then(resolve_time)
        .map_or(TimePoint::DateOnly(date), |clock| TimePoint::Exact(clock.on(date)));
    let end = end_text
        .and_then(resolve_time)
        .map_or(TimePoint::Unresolved, |clock| TimePoint::Exact(clock.on(date)));

    (start, roll_over_end(start, end))
}

/// Moves an exact end that precedes its exact start forward by one day.
fn roll_over_end(start: TimePoint, end: TimePoint) -> TimePoint {
    match (start, end) {
        (TimePoint::Exact(start_at), TimePoint::Exact(end_at)) if end_at < start_at => {
            TimePoint::Exact(end_at + Duration::days(1))
        }
        _ => end,
    }
}

/// Reads a calendar date from a fragment.
///
/// Accepts month names ("22-Aug", "Aug 22, 2020", "2020-Aug-22") and numeric
/// dates (`2020-08-22`, day-first `22/08/2020`). Weekday names and ordinal
/// suffixes are ignored. Without a 4-digit year, `default_year` is used; a
/// 4-digit token outside 1900..=2100 makes the date unresolved.
pub fn resolve_date(fragment: &str, default_year: i32) -> Option<NaiveDate> {
    let lowered = fragment.to_lowercase();
    let mut year: Option<i32> = None;
    let mut year_first = false;
    let mut month: Option<u32> = None;
    let mut numbers: Vec<u32> = Vec::new();

    for token in lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        if token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit()) {
            let value: i32 = token.parse().ok()?;
            if year.is_some() || !PLAUSIBLE_YEARS.contains(&value) {
                return None;
            }
            year_first = numbers.is_empty() && month.is_none();
            year = Some(value);
        } else if let Some(day) = numeric_token(token) {
            numbers.push(day);
        } else if let Some(m) = month_token(token) {
            if month.is_some() {
                return None;
            }
            month = Some(m);
        } else if !is_weekday_token(token) {
            return None;
        }
    }

    let year = year.unwrap_or(default_year);
    let (month, day) = match (month, numbers.as_slice()) {
        (Some(month), [day]) => (month, *day),
        (None, [first, second]) if year_first => (*first, *second),
        (None, [day, month]) => (*month, *day),
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Reads a clock time from a fragment.
///
/// A bare number is only accepted with a meridiem ("2pm"), since on its own
/// it is indistinguishable from a day of the month.
pub fn resolve_time(fragment: &str) -> Option<ClockTime> {
    let caps = CLOCK_RE.captures(fragment.trim())?;
    let mut hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let second: u32 = caps.get(3).map_or(Ok(0), |m| m.as_str().parse()).ok()?;
    let meridiem = caps.get(4).map(|m| m.as_str().to_ascii_lowercase());

    match meridiem.as_deref() {
        Some(half) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if half == "p" {
                hour += 12;
            }
        }
        None => {
            caps.get(2)?;
            if hour == 24 && minute == 0 && second == 0 {
                return Some(ClockTime::EndOfDay);
            }
        }
    }

    NaiveTime::from_hms_opt(hour, minute, second).map(ClockTime::At)
}

/// Splits clock times out of a date fragment.
///
/// Returns the remaining date text and the clock times in order of
/// appearance. `HH:MM` readings are always clocks. A 4-digit token is the
/// year when it is the first plausible year in the fragment, otherwise a
/// compact `HHMM` clock if it reads as one ("22-Aug 0800").
fn split_embedded_times(fragment: &str) -> (Option<String>, Vec<String>) {
    if let Some(caps) = ISO_TIMESTAMP_RE.captures(fragment) {
        return (Some(caps[1].to_string()), vec![caps[2].to_string()]);
    }

    let text = ISO_SEPARATOR_RE.replace_all(fragment, "$1 $2");
    let mut spans: Vec<(usize, usize)> = EMBEDDED_CLOCK_RE
        .find_iter(&text)
        .map(|m| (m.start(), m.end()))
        .collect();

    let mut year_seen = false;
    for caps in FOUR_DIGIT_RE.captures_iter(&text) {
        let (Some(whole), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let plausible_year = digits
            .as_str()
            .parse::<i32>()
            .is_ok_and(|value| PLAUSIBLE_YEARS.contains(&value));
        if plausible_year && !year_seen {
            year_seen = true;
        } else if resolve_time(whole.as_str()).is_some() {
            spans.push((whole.start(), whole.end()));
        }
    }
    spans.sort_unstable();

    let times: Vec<String> = spans
        .iter()
        .map(|&(start, end)| text[start..end].to_string())
        .collect();
    let mut rest = String::with_capacity(text.len());
    let mut cursor = 0;
    for &(start, end) in &spans {
        rest.push_str(&text[cursor..start]);
        rest.push(' ');
        cursor = end;
    }
    rest.push_str(&text[cursor..]);
    let rest = rest
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '–' | ',' | '/'))
        .to_string();

    ((!rest.is_empty()).then_some(rest), times)
}

/// Splits "14:50-15:00" into its two readings when both parse.
fn split_clock_range(fragment: &str) -> Option<(&str, &str)> {
    let caps = CLOCK_RANGE_RE.captures(fragment)?;
    let from = caps.get(1)?.as_str().trim();
    let to = caps.get(2)?.as_str().trim();
    (resolve_time(from).is_some() && resolve_time(to).is_some()).then_some((from, to))
}

/// Returns the trimmed fragment unless it is blank or a null placeholder.
fn meaningful(fragment: Option<&str>) -> Option<&str> {
    let trimmed = fragment?.trim();
    let placeholder = matches!(
        trimmed.to_ascii_lowercase().as_str(),
        "" | "none" | "null" | "nan" | "nat" | "n/a"
    );
    (!placeholder).then_some(trimmed)
}

fn numeric_token(token: &str) -> Option<u32> {
    if token.len() <= 2 && token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().ok();
    }
    ORDINAL_RE.captures(token)?[1].parse().ok()
}

fn month_token(token: &str) -> Option<u32> {
    if token.len() < 3 {
        return None;
    }
    let position = MONTHS.iter().position(|name| name.starts_with(token))?;
    u32::try_from(position + 1).ok()
}

fn is_weekday_token(token: &str) -> bool {
    token.len() >= 3 && WEEKDAYS.iter().any(|name| name.starts_with(token))
}

//! Candidate and normalized Statement of Facts events.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::DocumentId;

/// Seconds in one laytime day.
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// A candidate event as handed over by the extraction step.
///
/// Every field is optional on the wire. Extraction output is noisy, so
/// deserialization accepts the legacy key names (`filename`, `event`, `date`,
/// `start_time`, `end_time`, `laytime_counts`), numeric time fragments and
/// `null` anywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    /// The document this event was read from.
    #[serde(default, alias = "filename", deserialize_with = "lenient_document")]
    pub document_id: DocumentId,

    /// Free-text event description, e.g. "Commenced loading".
    #[serde(default, alias = "event", deserialize_with = "lenient_text")]
    pub event_name: String,

    /// Date fragment such as "22-Aug" or "2020-Aug-22 14:50-15:00".
    #[serde(default, alias = "date", deserialize_with = "lenient_fragment")]
    pub date_fragment: Option<String>,

    /// Start time fragment such as "08:00".
    #[serde(default, alias = "start_time", deserialize_with = "lenient_fragment")]
    pub start_fragment: Option<String>,

    /// End time fragment.
    #[serde(default, alias = "end_time", deserialize_with = "lenient_fragment")]
    pub end_fragment: Option<String>,

    /// The source line the event was extracted from.
    #[serde(default, deserialize_with = "lenient_text")]
    pub raw_line: String,

    /// Whether the extractor believes this event counts as laytime.
    #[serde(default, alias = "laytime_counts", deserialize_with = "lenient_flag")]
    pub laytime_hint: Option<bool>,
}

impl RawEvent {
    /// Creates a candidate with only a document and a name set.
    pub fn new(document_id: impl Into<String>, event_name: impl Into<String>) -> Self {
        Self {
            document_id: DocumentId::new(document_id),
            event_name: event_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_date(mut self, fragment: impl Into<String>) -> Self {
        self.date_fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn with_start(mut self, fragment: impl Into<String>) -> Self {
        self.start_fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn with_end(mut self, fragment: impl Into<String>) -> Self {
        self.end_fragment = Some(fragment.into());
        self
    }

    #[must_use]
    pub fn with_laytime_hint(mut self, counts: bool) -> Self {
        self.laytime_hint = Some(counts);
        self
    }
}

/// A resolved or unresolved point in time.
///
/// Temporal fields are always one of these variants, never a sentinel string,
/// so later stages branch on the tag instead of re-parsing text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "precision", content = "value", rename_all = "snake_case")]
pub enum TimePoint {
    /// Date and clock time both known.
    Exact(NaiveDateTime),
    /// Only the date is known; treated as midnight.
    DateOnly(NaiveDate),
    /// Nothing could be parsed.
    #[default]
    Unresolved,
}

impl TimePoint {
    /// The absolute instant, if any. Date-only points resolve to midnight.
    pub fn instant(self) -> Option<NaiveDateTime> {
        match self {
            Self::Exact(at) => Some(at),
            Self::DateOnly(date) => Some(date.and_time(NaiveTime::MIN)),
            Self::Unresolved => None,
        }
    }

    /// The calendar date, if any.
    pub fn date(self) -> Option<NaiveDate> {
        self.instant().map(|at| at.date())
    }

    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl From<NaiveDateTime> for TimePoint {
    fn from(at: NaiveDateTime) -> Self {
        Self::Exact(at)
    }
}

/// An event with its fragments resolved into time points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub document_id: DocumentId,
    pub event_name: String,
    pub start_instant: TimePoint,
    pub end_instant: TimePoint,
    pub counts_as_laytime: bool,
    pub raw_line: String,
}

impl NormalizedEvent {
    /// Start and end instants when both are resolved.
    pub fn interval(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.start_instant.instant()?, self.end_instant.instant()?))
    }

    /// Elapsed time between start and end, if both are resolved.
    pub fn duration(&self) -> Option<Duration> {
        self.interval().map(|(start, end)| end - start)
    }

    /// Contribution of this event to consumed laytime, in days.
    #[expect(
        clippy::cast_precision_loss,
        reason = "second counts stay far below 2^52"
    )]
    pub fn laytime_days(&self) -> f64 {
        if !self.counts_as_laytime {
            return 0.0;
        }
        match self.duration() {
            Some(duration) if duration > Duration::zero() => {
                duration.num_seconds() as f64 / SECONDS_PER_DAY
            }
            _ => 0.0,
        }
    }

    /// Human-readable start date, e.g. "Sat, 22 Aug 2020".
    pub fn display_date(&self) -> String {
        self.start_instant.date().map_or_else(
            || "No Date".to_string(),
            |date| date.format("%a, %d %b %Y").to_string(),
        )
    }
}

/// Formats a positive duration as hours and minutes, e.g. "6h 0m".
///
/// Zero and negative durations render as an empty string.
pub fn format_duration(duration: Duration) -> String {
    if duration <= Duration::zero() {
        return String::new();
    }
    let minutes = duration.num_minutes();
    format!("{}h {}m", minutes / 60, minutes % 60)
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_fragment(deserializer)?.unwrap_or_default())
}

fn lenient_document<'de, D>(deserializer: D) -> Result<DocumentId, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer).map(DocumentId::new)
}

fn lenient_fragment<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => Some(b),
        serde_json::Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        serde_json::Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Some(true),
            "no" | "n" | "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

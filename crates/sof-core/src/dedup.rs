//! Removal of near-duplicate events.
//!
//! Extraction often reports the same occurrence twice with slightly different
//! wording ("Arrived at anchorage" / "Vessel arrived anchorage"). Two events
//! are duplicates when their start falls in the same time bucket and one
//! normalized name contains the other. The earliest one in input order wins.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::event::NormalizedEvent;
use crate::types::{DocumentId, ValidationError};

/// Words dropped from event names before comparison.
pub const DEFAULT_STOP_WORDS: &[&str] = &["at", "the", "and"];

/// Width of the time bucket two duplicates must share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketGranularity {
    Minute,
    #[default]
    Hour,
    Day,
}

impl BucketGranularity {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }

    /// The bucket label of an instant, e.g. `2020-08-22T14` for hours.
    pub fn bucket(self, at: NaiveDateTime) -> String {
        let pattern = match self {
            Self::Minute => "%Y-%m-%dT%H:%M",
            Self::Hour => "%Y-%m-%dT%H",
            Self::Day => "%Y-%m-%d",
        };
        at.format(pattern).to_string()
    }
}

impl fmt::Display for BucketGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BucketGranularity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            _ => Err(ValidationError::InvalidGranularity {
                value: s.to_string(),
            }),
        }
    }
}

/// How two normalized names within one bucket are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatch {
    /// One name is a substring of the other.
    #[default]
    Contains,
    /// Names are identical.
    Exact,
}

impl FromStr for NameMatch {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(Self::Contains),
            "exact" => Ok(Self::Exact),
            _ => Err(ValidationError::InvalidNameMatch {
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupConfig {
    /// Lower-case words removed from names before comparison.
    pub stop_words: Vec<String>,
    pub bucket: BucketGranularity,
    pub name_match: NameMatch,
    /// Only compare events from the same document. Off by default, so a
    /// copy of the same occurrence extracted from a second document is
    /// dropped too.
    pub per_document: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(ToString::to_string).collect(),
            bucket: BucketGranularity::default(),
            name_match: NameMatch::default(),
            per_document: false,
        }
    }
}

/// Comparison key of one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Lower-cased name without stop words, single-spaced.
    pub name: String,
    /// Time bucket of the start, `None` when the start is unresolved.
    pub bucket: Option<String>,
    /// Source document, set only when comparing per document.
    pub document: Option<DocumentId>,
}

impl Signature {
    /// Computes the signature of an event.
    pub fn of(event: &NormalizedEvent, config: &DedupConfig) -> Self {
        let lowered = event.event_name.to_lowercase();
        let name = lowered
            .split_whitespace()
            .filter(|word| !config.stop_words.iter().any(|stop| stop.as_str() == *word))
            .collect::<Vec<_>>()
            .join(" ");
        let bucket = event
            .start_instant
            .instant()
            .map(|at| config.bucket.bucket(at));
        let document = config.per_document.then(|| event.document_id.clone());
        Self {
            name,
            bucket,
            document,
        }
    }

    /// Whether two signatures describe the same occurrence.
    ///
    /// Events without a time are only duplicates of each other when their
    /// names are identical; a missing time is not evidence of identity.
    pub fn is_duplicate_of(&self, other: &Self, mode: NameMatch) -> bool {
        if self.document != other.document {
            return false;
        }
        match (&self.bucket, &other.bucket) {
            (Some(a), Some(b)) if a == b => match mode {
                NameMatch::Exact => self.name == other.name,
                NameMatch::Contains => {
                    !self.name.is_empty()
                        && !other.name.is_empty()
                        && (self.name.contains(&other.name) || other.name.contains(&self.name))
                }
            },
            (None, None) => self.name == other.name,
            _ => false,
        }
    }
}

/// Drops events that duplicate an earlier kept event.
///
/// Survivors keep their relative order. Every kept event is compared against
/// every earlier kept event, so the output contains no duplicate pair and a
/// second pass returns it unchanged.
pub fn deduplicate(events: &[NormalizedEvent], config: &DedupConfig) -> Vec<NormalizedEvent> {
    let mut kept: Vec<(Signature, &NormalizedEvent)> = Vec::with_capacity(events.len());

    for event in events {
        let signature = Signature::of(event, config);
        if let Some((_, original)) = kept
            .iter()
            .find(|(seen, _)| signature.is_duplicate_of(seen, config.name_match))
        {
            tracing::debug!(
                dropped = %event.event_name,
                kept = %original.event_name,
                "dropping duplicate event"
            );
            continue;
        }
        kept.push((signature, event));
    }

    kept.into_iter().map(|(_, event)| event.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::TimePoint;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 8, 22)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn event(name: &str, start: Option<NaiveDateTime>) -> NormalizedEvent {
        NormalizedEvent {
            document_id: DocumentId::new("sof"),
            event_name: name.to_string(),
            start_instant: start.map_or(TimePoint::Unresolved, TimePoint::Exact),
            end_instant: TimePoint::Unresolved,
            counts_as_laytime: false,
            raw_line: String::new(),
        }
    }

    fn names(events: &[NormalizedEvent]) -> Vec<&str> {
        events.iter().map(|e| e.event_name.as_str()).collect()
    }

    #[test]
    fn signature_strips_stop_words_as_whole_words() {
        let sig = Signature::of(
            &event("Vessel  arrived at the Anchorage", Some(at(6, 12))),
            &DedupConfig::default(),
        );
        assert_eq!(sig.name, "vessel arrived anchorage");
        assert_eq!(sig.bucket.as_deref(), Some("2020-08-22T06"));

        let sig = Signature::of(&event("Cargo operations", None), &DedupConfig::default());
        assert_eq!(sig.name, "cargo operations");
        assert_eq!(sig.bucket, None);
    }

    #[test]
    fn reworded_event_in_same_hour_is_dropped() {
        let events = vec![
            event("Arrived at anchorage", Some(at(6, 0))),
            event("Vessel arrived anchorage", Some(at(6, 40))),
        ];

        let deduped = deduplicate(&events, &DedupConfig::default());
        assert_eq!(names(&deduped), vec!["Arrived at anchorage"]);
    }

    #[test]
    fn same_wording_in_different_hours_is_kept() {
        let events = vec![
            event("Arrived at anchorage", Some(at(6, 0))),
            event("Arrived at anchorage", Some(at(7, 0))),
        ];

        let deduped = deduplicate(&events, &DedupConfig::default());
        assert_eq!(deduped.len(), 2);
    }

    #[test]
    fn untimed_events_need_identical_names() {
        let events = vec![
            event("Notice of readiness tendered", None),
            event("Notice of readiness", None),
            event("Notice of readiness tendered", None),
        ];

        let deduped = deduplicate(&events, &DedupConfig::default());
        assert_eq!(
            names(&deduped),
            vec!["Notice of readiness tendered", "Notice of readiness"]
        );
    }

    #[test]
    fn timed_and_untimed_never_merge() {
        let events = vec![
            event("Pilot on board", Some(at(5, 0))),
            event("Pilot on board", None),
        ];

        assert_eq!(deduplicate(&events, &DedupConfig::default()).len(), 2);
    }

    #[test]
    fn survivors_keep_input_order() {
        let events = vec![
            event("Free pratique granted", Some(at(9, 0))),
            event("Pilot on board", Some(at(5, 0))),
            event("Pilot on board vessel", Some(at(5, 30))),
            event("All fast", Some(at(7, 0))),
        ];

        let deduped = deduplicate(&events, &DedupConfig::default());
        assert_eq!(
            names(&deduped),
            vec!["Free pratique granted", "Pilot on board", "All fast"]
        );
    }

    #[test]
    fn granularity_and_match_mode_are_configurable() {
        let events = vec![
            event("Arrived at anchorage", Some(at(6, 0))),
            event("Vessel arrived anchorage", Some(at(9, 0))),
        ];

        let daily = DedupConfig {
            bucket: BucketGranularity::Day,
            ..DedupConfig::default()
        };
        assert_eq!(deduplicate(&events, &daily).len(), 1);

        let exact = DedupConfig {
            bucket: BucketGranularity::Day,
            name_match: NameMatch::Exact,
            ..DedupConfig::default()
        };
        assert_eq!(deduplicate(&events, &exact).len(), 2);
    }

    #[test]
    fn documents_merge_unless_compared_per_document() {
        let mut copy = event("Arrived at anchorage", Some(at(6, 10)));
        copy.document_id = DocumentId::new("other");
        let events = vec![event("Arrived at anchorage", Some(at(6, 0))), copy];

        assert_eq!(deduplicate(&events, &DedupConfig::default()).len(), 1);

        let per_document = DedupConfig {
            per_document: true,
            ..DedupConfig::default()
        };
        assert_eq!(deduplicate(&events, &per_document).len(), 2);
    }

    #[test]
    fn granularity_parses() {
        assert_eq!("day".parse::<BucketGranularity>().unwrap(), BucketGranularity::Day);
        assert_eq!(BucketGranularity::Minute.to_string(), "minute");
        assert!("week".parse::<BucketGranularity>().is_err());
        assert_eq!("exact".parse::<NameMatch>().unwrap(), NameMatch::Exact);
    }

    fn arbitrary_event() -> impl Strategy<Value = NormalizedEvent> {
        let name = prop::sample::select(vec![
            "Arrived",
            "Arrived at anchorage",
            "Vessel arrived anchorage",
            "Pilot on board",
            "the",
            "",
            "All fast",
        ]);
        let time = prop::option::weighted(0.8, (4u32..8, 0u32..60));
        (name, time).prop_map(|(name, time)| event(name, time.map(|(h, m)| at(h, m))))
    }

    proptest! {
        #[test]
        fn second_pass_is_a_no_op(events in prop::collection::vec(arbitrary_event(), 0..40)) {
            let config = DedupConfig::default();
            let once = deduplicate(&events, &config);
            let twice = deduplicate(&once, &config);
            prop_assert_eq!(once, twice);
        }
    }
}

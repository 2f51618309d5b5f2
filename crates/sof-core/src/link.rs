//! Pairing of start and end actions into intervals.
//!
//! A Statement of Facts usually reports "Commenced loading 08:00" and
//! "Completed loading 14:00" as separate lines. The linker merges such pairs
//! into one event whose end is the end line's start, and drops the end line.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::event::{NormalizedEvent, TimePoint};
use crate::types::{MarkerWord, ValidationError};

/// Start/end verb pairs recognised by default.
pub const DEFAULT_LINK_PAIRS: &[(&str, &str)] = &[
    ("commenced", "completed"),
    ("started", "finished"),
    ("began", "ended"),
    ("connected", "disconnected"),
    ("opened", "closed"),
];

/// Filler words that never count as a shared subject.
pub const DEFAULT_IGNORED_TOKENS: &[&str] = &["a", "an", "at", "the", "and", "of"];

/// A start marker and the end marker that closes it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LinkPair {
    pub start: MarkerWord,
    pub end: MarkerWord,
}

impl LinkPair {
    /// Creates a pair after validating both words.
    pub fn new(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = MarkerWord::new(start)?;
        let end = MarkerWord::new(end)?;
        if start == end {
            return Err(ValidationError::IdenticalMarkers {
                value: start.to_string(),
            });
        }
        Ok(Self { start, end })
    }
}

/// Configuration for start/end linking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Pairs are tried in order; the first start marker found in an event
    /// name decides which end marker is searched for.
    pub pairs: Vec<LinkPair>,

    /// Lower-case tokens excluded from the shared-subject test. An empty
    /// list makes any shared token, filler words included, enough to link.
    pub ignored_tokens: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            pairs: DEFAULT_LINK_PAIRS
                .iter()
                .filter_map(|(start, end)| LinkPair::new(start, end).ok())
                .collect(),
            ignored_tokens: DEFAULT_IGNORED_TOKENS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

/// One start/end merge, as positions in the linker's input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LinkedPair {
    pub start_index: usize,
    pub end_index: usize,
}

/// Output of [`link_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linked {
    /// Surviving events in chronological order per document.
    pub events: Vec<NormalizedEvent>,

    /// Merges performed, in processing order.
    pub pairs: Vec<LinkedPair>,
}

/// Links start events to their matching end events.
///
/// Events are processed per document (documents in order of first
/// appearance) by ascending start, unresolved starts last, ties in input
/// order. For each open start event the nearest later unconsumed event in
/// the same document that carries the paired end marker and shares a subject
/// token closes it. Each event is consumed at most once, and a consumed event
/// is never used as a start.
pub fn link_events(events: &[NormalizedEvent], config: &LinkConfig) -> Linked {
    let order = chronological_order(events);
    let tokens: Vec<Vec<String>> = events.iter().map(|e| tokenize(&e.event_name)).collect();
    let ignored: HashSet<&str> = config.ignored_tokens.iter().map(String::as_str).collect();

    let mut consumed = vec![false; events.len()];
    let mut closed_by: Vec<Option<TimePoint>> = vec![None; events.len()];
    let mut pairs = Vec::new();

    for (position, &i) in order.iter().enumerate() {
        if consumed[i] || events[i].end_instant.is_resolved() {
            continue;
        }
        let Some(pair) = config
            .pairs
            .iter()
            .find(|pair| has_token(&tokens[i], &pair.start))
        else {
            continue;
        };

        let subject = subject_tokens(&tokens[i], &pair.start, &ignored);
        if subject.is_empty() {
            continue;
        }

        let matched = order[position + 1..]
            .iter()
            .copied()
            .take_while(|&j| events[j].document_id == events[i].document_id)
            .find(|&j| {
                !consumed[j]
                    && has_token(&tokens[j], &pair.end)
                    && !subject_tokens(&tokens[j], &pair.end, &ignored).is_disjoint(&subject)
            });

        if let Some(j) = matched {
            tracing::debug!(
                document = %events[i].document_id,
                start = %events[i].event_name,
                end = %events[j].event_name,
                "linked start and end events"
            );
            consumed[j] = true;
            closed_by[i] = Some(events[j].start_instant);
            pairs.push(LinkedPair {
                start_index: i,
                end_index: j,
            });
        }
    }

    let events = order
        .iter()
        .filter(|&&i| !consumed[i])
        .map(|&i| {
            let mut event = events[i].clone();
            if let Some(end) = closed_by[i] {
                event.end_instant = end;
            }
            event
        })
        .collect();

    Linked { events, pairs }
}

/// Input positions sorted by document, then resolved start, then input order.
fn chronological_order(events: &[NormalizedEvent]) -> Vec<usize> {
    let mut document_rank = HashMap::new();
    for event in events {
        let next = document_rank.len();
        document_rank.entry(&event.document_id).or_insert(next);
    }

    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by_key(|&i| {
        let start = events[i].start_instant.instant();
        (document_rank[&events[i].document_id], start.is_none(), start)
    });
    order
}

/// Lower-cased alphanumeric words of an event name.
fn tokenize(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn has_token(tokens: &[String], marker: &MarkerWord) -> bool {
    tokens.iter().any(|t| t == marker.as_str())
}

/// Tokens left once the marker and filler words are removed.
fn subject_tokens<'a>(
    tokens: &'a [String],
    marker: &MarkerWord,
    ignored: &HashSet<&str>,
) -> HashSet<&'a str> {
    tokens
        .iter()
        .map(String::as_str)
        .filter(|t| *t != marker.as_str() && !ignored.contains(t))
        .collect()
}

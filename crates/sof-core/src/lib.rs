//! Core domain logic for Statement of Facts laytime.
//!
//! This crate contains the fundamental types and logic for:
//! - Normalization: resolving date and time fragments into instants
//! - Linking: merging "commenced"/"completed" pairs into intervals
//! - Deduplication: dropping reworded copies of the same occurrence
//! - Accrual: laytime allowed vs. consumed, demurrage and dispatch

pub mod dedup;
pub mod event;
pub mod laytime;
pub mod link;
pub mod normalize;
mod pipeline;
pub mod summary;
pub mod types;

pub use dedup::{BucketGranularity, DedupConfig, NameMatch, deduplicate};
pub use event::{NormalizedEvent, RawEvent, TimePoint, format_duration};
pub use laytime::{LaytimeResult, Outcome, calculate_laytime};
pub use link::{LinkConfig, LinkPair, Linked, link_events};
pub use normalize::{NormalizeConfig, normalize_events};
pub use pipeline::{PipelineConfig, calculate, finalize_events};
pub use summary::{SummaryError, VoyageSummary};
pub use types::{DocumentId, MarkerWord, ValidationError};

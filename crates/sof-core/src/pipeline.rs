//! End-to-end driver: normalize, link, deduplicate, accrue.

use crate::dedup::{DedupConfig, deduplicate};
use crate::event::{NormalizedEvent, RawEvent};
use crate::laytime::{LaytimeResult, calculate_laytime};
use crate::link::{LinkConfig, link_events};
use crate::normalize::{NormalizeConfig, normalize_events};
use crate::summary::VoyageSummary;

/// Settings for every pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub normalize: NormalizeConfig,
    pub link: LinkConfig,
    pub dedup: DedupConfig,
}

impl PipelineConfig {
    /// Default lexical tables with the given fallback year.
    pub fn new(default_year: i32) -> Self {
        Self {
            normalize: NormalizeConfig::new(default_year),
            link: LinkConfig::default(),
            dedup: DedupConfig::default(),
        }
    }
}

/// Turns raw candidates into the finalized timeline.
pub fn finalize_events(raw: &[RawEvent], config: &PipelineConfig) -> Vec<NormalizedEvent> {
    let normalized = normalize_events(raw, &config.normalize);
    let linked = link_events(&normalized, &config.link);
    let finalized = deduplicate(&linked.events, &config.dedup);
    tracing::debug!(
        raw = raw.len(),
        linked = linked.pairs.len(),
        finalized = finalized.len(),
        "finalized events"
    );
    finalized
}

/// Finalizes the candidates and runs the laytime calculation on them.
pub fn calculate(
    raw: &[RawEvent],
    summary: &VoyageSummary,
    config: &PipelineConfig,
) -> LaytimeResult {
    let events = finalize_events(raw, config);
    calculate_laytime(&events, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{TimePoint, format_duration};
    use chrono::NaiveDate;

    fn loading_day() -> Vec<RawEvent> {
        vec![
            RawEvent::new("sof.pdf", "Pilot on board")
                .with_date("22-Aug")
                .with_start("06:00")
                .with_laytime_hint(false),
            RawEvent::new("sof.pdf", "Commenced loading")
                .with_date("22-Aug")
                .with_start("08:00"),
            RawEvent::new("sof.pdf", "Completed loading")
                .with_date("22-Aug")
                .with_start("14:00"),
            RawEvent::new("sof.pdf", "Commenced  Loading")
                .with_date("22-Aug")
                .with_start("08:15"),
        ]
    }

    #[test]
    fn commenced_and_completed_become_one_interval() {
        let events = finalize_events(&loading_day(), &PipelineConfig::new(2020));

        let names: Vec<_> = events.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["Pilot on board", "Commenced loading"]);

        let loading = &events[1];
        let day = NaiveDate::from_ymd_opt(2020, 8, 22).unwrap();
        assert_eq!(
            loading.start_instant,
            TimePoint::Exact(day.and_hms_opt(8, 0, 0).unwrap())
        );
        assert_eq!(
            loading.end_instant,
            TimePoint::Exact(day.and_hms_opt(14, 0, 0).unwrap())
        );
        assert_eq!(format_duration(loading.duration().unwrap()), "6h 0m");
    }

    #[test]
    fn calculate_accrues_the_finalized_timeline() {
        let summary = VoyageSummary::new(1_000.0, 4_000.0, 10_000.0, 5_000.0);

        let result = calculate(&loading_day(), &summary, &PipelineConfig::new(2020));

        assert_eq!(result.finalized_events.len(), 2);
        assert!((result.allowed_days - 0.25).abs() < 1e-12);
        assert!((result.consumed_days - 0.25).abs() < 1e-12);
        assert!(result.demurrage_due.abs() < 1e-9);
        assert!(result.dispatch_due.abs() < 1e-9);
    }

    #[test]
    fn compact_clocks_in_date_fragments_link_into_hours() {
        let raw = vec![
            RawEvent::new("sof.pdf", "Commenced loading").with_date("22-Aug 0800"),
            RawEvent::new("sof.pdf", "Completed loading").with_date("22-Aug 1400"),
        ];
        let summary = VoyageSummary::new(10_000.0, 2_000.0, 15_000.0, 7_500.0);

        let result = calculate(&raw, &summary, &PipelineConfig::new(2020));

        assert_eq!(result.finalized_events.len(), 1);
        assert_eq!(
            format_duration(result.finalized_events[0].duration().unwrap()),
            "6h 0m"
        );
        assert!((result.consumed_days - 0.25).abs() < 1e-12);
        assert!(result.demurrage_due.abs() < 1e-9);
    }

    #[test]
    fn inputs_are_left_untouched() {
        let raw = loading_day();
        let before = raw.clone();
        let _ = finalize_events(&raw, &PipelineConfig::new(2020));
        assert_eq!(raw, before);
    }
}

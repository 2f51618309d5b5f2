//! Events command: the finalized timeline of one request file.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Serialize;
use sof_core::{NormalizedEvent, finalize_events, format_duration};

use crate::config::Config;
use crate::request::Request;

/// JSON timeline structure.
#[derive(Debug, Serialize)]
pub struct Timeline {
    pub file: String,
    pub default_year: i32,
    pub events: Vec<NormalizedEvent>,
}

/// Reads a request file and finalizes its events.
pub fn build_timeline(path: &Path, year: Option<i32>, config: &Config) -> Result<Timeline> {
    let request = Request::load(path)?;
    let default_year = request.year(year, config.default_year);
    let pipeline = config
        .pipeline(default_year)
        .context("invalid link pair in configuration")?;

    Ok(Timeline {
        file: path.display().to_string(),
        default_year,
        events: finalize_events(&request.events, &pipeline),
    })
}

/// Runs the events command.
pub fn run(path: &Path, year: Option<i32>, json: bool, config: &Config) -> Result<()> {
    let timeline = build_timeline(path, year, config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&timeline)?);
    } else {
        print!("{}", format_timeline(&timeline.events));
    }
    Ok(())
}

/// Clock time of an instant, or "-".
fn clock(at: Option<NaiveDateTime>) -> String {
    at.map_or_else(|| "-".to_string(), |at| at.format("%H:%M").to_string())
}

/// End clock time, suffixed with the day offset when it falls after the start date.
fn end_clock(event: &NormalizedEvent) -> String {
    match event.interval() {
        Some((start, end)) => {
            let days = (end.date() - start.date()).num_days();
            if days > 0 {
                format!("{}+{days}d", end.format("%H:%M"))
            } else {
                end.format("%H:%M").to_string()
            }
        }
        None => clock(event.end_instant.instant()),
    }
}

/// Formats the finalized events as a table.
pub fn format_timeline(events: &[NormalizedEvent]) -> String {
    let mut output = String::new();

    if events.is_empty() {
        writeln!(output, "No events.").unwrap();
        return output;
    }

    let doc_width = events
        .iter()
        .map(|e| e.document_id.as_str().chars().count())
        .chain(std::iter::once("DOCUMENT".len()))
        .max()
        .unwrap_or_default();
    let name_width = events
        .iter()
        .map(|e| e.event_name.chars().count())
        .chain(std::iter::once("EVENT".len()))
        .max()
        .unwrap_or_default();

    writeln!(
        output,
        "{:<doc_width$}  {:<name_width$}  {:<16}  {:<5}  {:<8}  {:<8}  LAYTIME",
        "DOCUMENT", "EVENT", "DATE", "START", "END", "DURATION"
    )
    .unwrap();

    for event in events {
        let duration = event
            .duration()
            .map(format_duration)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| "-".to_string());
        let laytime = if event.counts_as_laytime && event.laytime_days() > 0.0 {
            format!("{:.4}", event.laytime_days())
        } else {
            "-".to_string()
        };
        writeln!(
            output,
            "{:<doc_width$}  {:<name_width$}  {:<16}  {:<5}  {:<8}  {:<8}  {laytime}",
            event.document_id.as_str(),
            event.event_name,
            event.display_date(),
            clock(event.start_instant.instant()),
            end_clock(event),
            duration,
        )
        .unwrap();
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use insta::assert_snapshot;
    use sof_core::{DocumentId, TimePoint};

    fn at(day: u32, hour: u32, minute: u32) -> TimePoint {
        TimePoint::Exact(
            NaiveDate::from_ymd_opt(2020, 8, day)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
        )
    }

    fn event(name: &str, start: TimePoint, end: TimePoint, counts: bool) -> NormalizedEvent {
        NormalizedEvent {
            document_id: DocumentId::new("sof.pdf"),
            event_name: name.to_string(),
            start_instant: start,
            end_instant: end,
            counts_as_laytime: counts,
            raw_line: String::new(),
        }
    }

    #[test]
    fn test_format_timeline() {
        let events = vec![
            event("Pilot on board", at(22, 6, 0), TimePoint::Unresolved, false),
            event("Commenced loading", at(22, 8, 0), at(22, 14, 0), true),
            event("Shifting", at(22, 23, 0), at(23, 1, 30), false),
        ];

        let output = format_timeline(&events);
        assert_snapshot!(output.trim_end(), @r"
        DOCUMENT  EVENT              DATE              START  END       DURATION  LAYTIME
        sof.pdf   Pilot on board     Sat, 22 Aug 2020  06:00  -         -         -
        sof.pdf   Commenced loading  Sat, 22 Aug 2020  08:00  14:00     6h 0m     0.2500
        sof.pdf   Shifting           Sat, 22 Aug 2020  23:00  01:30+1d  2h 30m    -
        ");
    }

    #[test]
    fn test_format_timeline_empty() {
        assert_eq!(format_timeline(&[]), "No events.\n");
    }

    #[test]
    fn test_unresolved_start_shows_no_date() {
        let events = vec![event(
            "Notice of readiness",
            TimePoint::Unresolved,
            TimePoint::Unresolved,
            true,
        )];
        let output = format_timeline(&events);
        let row = output.lines().nth(1).unwrap();
        assert!(row.contains("No Date"));
        assert!(row.ends_with("-         -         -"));
    }
}

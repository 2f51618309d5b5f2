//! Calculate command: laytime, demurrage and dispatch per request file.
//!
//! Request files are independent, so they are evaluated in parallel and
//! reported in the order given on the command line.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use sof_core::{LaytimeResult, Outcome, calculate};

use crate::config::Config;
use crate::request::Request;

/// Result of one request file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub file: String,
    pub default_year: i32,
    pub outcome: Outcome,
    #[serde(flatten)]
    pub result: LaytimeResult,
}

/// Reads a request file and runs the full calculation on it.
pub fn evaluate(path: &Path, year: Option<i32>, config: &Config) -> Result<FileReport> {
    let request = Request::load(path)?;
    let default_year = request.year(year, config.default_year);
    let pipeline = config
        .pipeline(default_year)
        .context("invalid link pair in configuration")?;
    let summary = request
        .voyage_summary()
        .with_context(|| format!("invalid summary in {}", path.display()))?;

    let result = calculate(&request.events, &summary, &pipeline);
    tracing::debug!(
        file = %path.display(),
        events = result.finalized_events.len(),
        consumed_days = result.consumed_days,
        "calculated laytime"
    );

    Ok(FileReport {
        file: path.display().to_string(),
        default_year,
        outcome: result.outcome(),
        result,
    })
}

/// Runs the calculate command.
pub fn run(files: &[PathBuf], year: Option<i32>, json: bool, config: &Config) -> Result<()> {
    let reports = files
        .par_iter()
        .map(|path| evaluate(path, year, config))
        .collect::<Result<Vec<_>>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        let rendered: Vec<String> = reports.iter().map(format_report).collect();
        print!("{}", rendered.join("\n"));
    }
    Ok(())
}

/// Formats the human-readable report of one file.
pub fn format_report(report: &FileReport) -> String {
    let mut output = String::new();
    let result = &report.result;

    let header = format!("LAYTIME REPORT: {}", report.file);
    writeln!(output, "{header}").unwrap();
    writeln!(output, "{}", "─".repeat(header.chars().count())).unwrap();
    writeln!(
        output,
        "Events finalized:  {}",
        result.finalized_events.len()
    )
    .unwrap();
    writeln!(output, "Laytime allowed:   {:.4} days", result.allowed_days).unwrap();
    writeln!(output, "Laytime consumed:  {:.4} days", result.consumed_days).unwrap();
    match report.outcome {
        Outcome::Demurrage { days, .. } => {
            writeln!(output, "Time exceeded:     {days:.4} days").unwrap();
        }
        Outcome::Dispatch { days, .. } => {
            writeln!(output, "Time saved:        {days:.4} days").unwrap();
        }
    }
    writeln!(output, "Demurrage due:     {:.2}", result.demurrage_due).unwrap();
    writeln!(output, "Dispatch due:      {:.2}", result.dispatch_due).unwrap();

    writeln!(output).unwrap();
    writeln!(output, "CALCULATION LOG").unwrap();
    writeln!(output, "───────────────").unwrap();
    for line in &result.calculation_log {
        writeln!(output, "{line}").unwrap();
    }

    output
}

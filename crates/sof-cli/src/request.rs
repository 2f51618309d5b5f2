//! Request files: a voyage summary plus extracted events.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use serde::Deserialize;
use serde_json::{Map, Value};
use sof_core::{RawEvent, VoyageSummary};

/// One calculation request as read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    /// Year for day/month dates, overridden by `--year`.
    #[serde(default)]
    pub default_year: Option<i32>,

    /// Loose key/value voyage summary.
    #[serde(default)]
    pub summary: Option<Value>,

    /// Candidate events from extraction.
    #[serde(default)]
    pub events: Vec<RawEvent>,
}

impl Request {
    /// Reads and parses a request file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// The voyage summary; a missing one reads as an empty map.
    pub fn voyage_summary(&self) -> Result<VoyageSummary> {
        match &self.summary {
            Some(value) => Ok(VoyageSummary::from_value(value)?),
            None => Ok(VoyageSummary::from_map(&Map::new())),
        }
    }

    /// Picks the fallback year: flag, then request, then config, then today.
    pub fn year(&self, flag: Option<i32>, configured: Option<i32>) -> i32 {
        flag.or(self.default_year)
            .or(configured)
            .unwrap_or_else(|| Local::now().year())
    }
}

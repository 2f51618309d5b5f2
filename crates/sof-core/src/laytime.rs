//! Laytime accrual.
//!
//! Computes allowed laytime from the voyage figures, consumed laytime from
//! the finalized intervals, and the resulting demurrage or dispatch.
//!
//! # Calculation
//!
//! 1. `allowed = cargo_quantity / rate_per_day`, or 0 with a warning when the
//!    rate is zero.
//! 2. `consumed` sums every event that counts as laytime and has a resolved,
//!    positive interval, in days of 24 hours.
//! 3. `delta = consumed - allowed`. A positive delta is charged at the
//!    demurrage rate; otherwise the saved time earns dispatch.
//!
//! Data problems never abort the calculation. They show up as warnings in
//! the calculation log, which records every intermediate figure.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::event::{NormalizedEvent, SECONDS_PER_DAY};
use crate::summary::{SummaryField, VoyageSummary};

/// Result of one laytime calculation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LaytimeResult {
    pub allowed_days: f64,
    pub consumed_days: f64,
    /// Days saved when laytime was not exhausted; 0 when it was exceeded.
    pub saved_or_exceeded_days: f64,
    pub demurrage_due: f64,
    pub dispatch_due: f64,
    /// Human-readable trace of every figure, in calculation order.
    pub calculation_log: Vec<String>,
    pub finalized_events: Vec<NormalizedEvent>,
}

/// Which side of the allowance the voyage ended on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Demurrage { days: f64, amount: f64 },
    Dispatch { days: f64, amount: f64 },
}

impl LaytimeResult {
    /// Summarizes the result as demurrage or dispatch.
    pub fn outcome(&self) -> Outcome {
        let delta = self.consumed_days - self.allowed_days;
        if delta > 0.0 {
            Outcome::Demurrage {
                days: delta,
                amount: self.demurrage_due,
            }
        } else {
            Outcome::Dispatch {
                days: self.saved_or_exceeded_days,
                amount: self.dispatch_due,
            }
        }
    }
}

/// How the finalized events contributed to consumed laytime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccrualTally {
    /// Events whose interval was summed.
    pub used: Vec<usize>,
    /// Events that do not count as laytime.
    pub not_laytime: usize,
    /// Laytime events without both a start and an end.
    pub missing_time: usize,
    /// Laytime events whose end does not follow their start.
    pub non_positive: usize,
    /// Sum of the used intervals.
    pub consumed: Duration,
}

impl AccrualTally {
    /// Sorts every event into exactly one category.
    pub fn of(events: &[NormalizedEvent]) -> Self {
        let mut tally = Self::default();
        for (index, event) in events.iter().enumerate() {
            if !event.counts_as_laytime {
                tally.not_laytime += 1;
                continue;
            }
            match event.duration() {
                None => tally.missing_time += 1,
                Some(duration) if duration <= Duration::zero() => tally.non_positive += 1,
                Some(duration) => {
                    tally.used.push(index);
                    tally.consumed += duration;
                }
            }
        }
        tally
    }
}

/// Runs the laytime calculation over a finalized event set.
#[expect(
    clippy::cast_precision_loss,
    reason = "second counts stay far below 2^52"
)]
pub fn calculate_laytime(events: &[NormalizedEvent], summary: &VoyageSummary) -> LaytimeResult {
    let mut log = Vec::new();

    for issue in &summary.issues {
        log.push(format!("Warning: {issue}"));
    }
    let cargo_quantity = checked_figure(summary, SummaryField::CargoQuantity, &mut log);
    let rate_per_day = checked_figure(summary, SummaryField::RatePerDay, &mut log);
    let demurrage_rate = checked_figure(summary, SummaryField::DemurrageRate, &mut log);
    let dispatch_rate = checked_figure(summary, SummaryField::DispatchRate, &mut log);

    log.push(format!(
        "Inputs: cargo quantity {cargo_quantity}, rate per day {rate_per_day}"
    ));
    log.push(format!(
        "Rates: demurrage {demurrage_rate}/day, dispatch {dispatch_rate}/day"
    ));

    let allowed_days = if rate_per_day > 0.0 {
        let allowed = cargo_quantity / rate_per_day;
        log.push(format!(
            "Laytime allowed: {cargo_quantity} / {rate_per_day} = {allowed:.4} days"
        ));
        allowed
    } else {
        tracing::warn!("load/discharge rate is zero, no laytime allowed");
        log.push("Warning: load/discharge rate is zero, laytime allowed set to 0.0000 days".to_string());
        0.0
    };

    let consumed_days = if events.is_empty() {
        tracing::warn!("no events available for laytime calculation");
        log.push("Warning: no events available, laytime consumed set to 0.0000 days".to_string());
        0.0
    } else {
        let tally = AccrualTally::of(events);
        log.push(format!("Laytime events used: {}", tally.used.len()));
        for &index in &tally.used {
            log.push(contribution_line(&events[index]));
        }
        log.push(format!("Skipped (not laytime): {}", tally.not_laytime));
        log.push(format!(
            "Skipped (missing start or end time): {}",
            tally.missing_time
        ));
        log.push(format!(
            "Skipped (non-positive duration): {}",
            tally.non_positive
        ));

        let seconds = tally.consumed.num_seconds() as f64;
        let consumed = seconds / SECONDS_PER_DAY;
        log.push(format!(
            "Time consumed: {:.2} hours = {consumed:.4} days",
            seconds / 3600.0
        ));
        consumed
    };

    let delta = consumed_days - allowed_days;
    log.push(format!(
        "Difference: {consumed_days:.4} - {allowed_days:.4} = {delta:.4} days"
    ));

    let (saved_or_exceeded_days, demurrage_due, dispatch_due) = if delta > 0.0 {
        let demurrage = delta * demurrage_rate;
        log.push(format!(
            "Time exceeded: {delta:.4} days x {demurrage_rate}/day = demurrage {demurrage:.2}"
        ));
        (0.0, demurrage, 0.0)
    } else {
        let saved = delta.abs();
        let dispatch = saved * dispatch_rate;
        log.push(format!(
            "Time saved: {saved:.4} days x {dispatch_rate}/day = dispatch {dispatch:.2}"
        ));
        (saved, 0.0, dispatch)
    };

    LaytimeResult {
        allowed_days,
        consumed_days,
        saved_or_exceeded_days,
        demurrage_due,
        dispatch_due,
        calculation_log: log,
        finalized_events: events.to_vec(),
    }
}

/// Returns a summary figure, replacing non-finite or negative values by 0.
fn checked_figure(summary: &VoyageSummary, field: SummaryField, log: &mut Vec<String>) -> f64 {
    let value = summary.figure(field);
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log.push(format!("Warning: {field} {value} is not usable, using 0.0"));
        0.0
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "second counts stay far below 2^52"
)]
fn contribution_line(event: &NormalizedEvent) -> String {
    let stamp = |at: Option<NaiveDateTime>| {
        at.map_or_else(String::new, |at| at.format("%Y-%m-%d %H:%M").to_string())
    };
    let hours = event
        .duration()
        .map_or(0.0, |d| d.num_seconds() as f64 / 3600.0);
    format!(
        "  + {} [{}] {} to {} = {hours:.2} hours",
        event.event_name,
        event.document_id,
        stamp(event.start_instant.instant()),
        stamp(event.end_instant.instant()),
    )
}

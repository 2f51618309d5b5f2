//! Voyage summary figures read from a loosely-typed map.
//!
//! The extraction step produces the summary as free key/value pairs, often
//! with the labels printed on the charter party recap ("CARGO QTY",
//! "LOAD/DISCH", ...) and amounts written as text ("USD 15,000/day"). Any
//! figure that is missing or unreadable becomes `0.0` and is recorded as a
//! [`FieldIssue`] so the laytime log can report the substitution.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors for summaries that are not a key/value map at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("voyage summary must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// The numeric figures the laytime calculation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryField {
    CargoQuantity,
    RatePerDay,
    DemurrageRate,
    DispatchRate,
}

impl SummaryField {
    pub const ALL: [Self; 4] = [
        Self::CargoQuantity,
        Self::RatePerDay,
        Self::DemurrageRate,
        Self::DispatchRate,
    ];

    /// Accepted keys, compared after lower-casing and dropping punctuation.
    const fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::CargoQuantity => &["cargoquantity", "cargoqty", "quantity"],
            Self::RatePerDay => &[
                "rateperday",
                "loaddisch",
                "loaddischrate",
                "loadrate",
                "dischargerate",
            ],
            Self::DemurrageRate => &["demurragerate", "demurrage"],
            Self::DispatchRate => &["dispatchrate", "dispatch", "despatchrate", "despatch"],
        }
    }

    fn matches_key(self, key: &str) -> bool {
        let folded: String = key
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        self.aliases().contains(&folded.as_str())
    }
}

impl fmt::Display for SummaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CargoQuantity => "cargo quantity",
            Self::RatePerDay => "load/discharge rate",
            Self::DemurrageRate => "demurrage rate",
            Self::DispatchRate => "dispatch rate",
        };
        write!(f, "{label}")
    }
}

/// Why a figure was replaced by `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Substitution {
    Missing,
    Malformed { value: String },
    Negative { value: f64 },
}

/// A figure that could not be taken at face value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldIssue {
    pub field: SummaryField,
    pub substitution: Substitution,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.substitution {
            Substitution::Missing => write!(f, "{} missing, using 0.0", self.field),
            Substitution::Malformed { value } => {
                write!(f, "{} value {value} is not numeric, using 0.0", self.field)
            }
            Substitution::Negative { value } => {
                write!(f, "{} {value} is negative, using 0.0", self.field)
            }
        }
    }
}

/// Voyage figures plus the descriptive fields carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoyageSummary {
    /// Cargo quantity, e.g. metric tonnes.
    pub cargo_quantity: f64,
    /// Load or discharge rate per day, in the same unit as the quantity.
    pub rate_per_day: f64,
    /// Money per day of demurrage.
    pub demurrage_rate: f64,
    /// Money per day of dispatch.
    pub dispatch_rate: f64,
    /// Port, cargo, vessel and other fields the calculation does not use.
    pub details: BTreeMap<String, Value>,
    /// Substitutions made while reading the figures.
    pub issues: Vec<FieldIssue>,
}

impl VoyageSummary {
    /// Creates a summary from known figures.
    pub fn new(cargo_quantity: f64, rate_per_day: f64, demurrage_rate: f64, dispatch_rate: f64) -> Self {
        Self {
            cargo_quantity,
            rate_per_day,
            demurrage_rate,
            dispatch_rate,
            ..Self::default()
        }
    }

    /// Reads a summary from any JSON value; only objects are accepted.
    pub fn from_value(value: &Value) -> Result<Self, SummaryError> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            Value::Null => Err(SummaryError::NotAnObject { kind: "null" }),
            Value::Bool(_) => Err(SummaryError::NotAnObject { kind: "a boolean" }),
            Value::Number(_) => Err(SummaryError::NotAnObject { kind: "a number" }),
            Value::String(_) => Err(SummaryError::NotAnObject { kind: "a string" }),
            Value::Array(_) => Err(SummaryError::NotAnObject { kind: "an array" }),
        }
    }

    /// Reads a summary from a key/value map. Never fails.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut summary = Self::default();
        let mut used: Vec<&str> = Vec::new();

        for field in SummaryField::ALL {
            let entry = map.iter().find(|(key, _)| field.matches_key(key));
            if let Some((key, _)) = entry {
                used.push(key.as_str());
            }

            let figure = match entry.map(|(_, value)| read_figure(value)) {
                Some(Ok(value)) if value < 0.0 => Err(Substitution::Negative { value }),
                Some(Ok(value)) => Ok(value),
                Some(Err(substitution)) => Err(substitution),
                None => Err(Substitution::Missing),
            };

            let value = figure.unwrap_or_else(|substitution| {
                let issue = FieldIssue {
                    field,
                    substitution,
                };
                tracing::debug!(%issue, "voyage summary substitution");
                summary.issues.push(issue);
                0.0
            });
            *summary.figure_mut(field) = value;
        }

        summary.details = map
            .iter()
            .filter(|(key, _)| !used.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        summary
    }

    /// The value of one figure.
    pub const fn figure(&self, field: SummaryField) -> f64 {
        match field {
            SummaryField::CargoQuantity => self.cargo_quantity,
            SummaryField::RatePerDay => self.rate_per_day,
            SummaryField::DemurrageRate => self.demurrage_rate,
            SummaryField::DispatchRate => self.dispatch_rate,
        }
    }

    const fn figure_mut(&mut self, field: SummaryField) -> &mut f64 {
        match field {
            SummaryField::CargoQuantity => &mut self.cargo_quantity,
            SummaryField::RatePerDay => &mut self.rate_per_day,
            SummaryField::DemurrageRate => &mut self.demurrage_rate,
            SummaryField::DispatchRate => &mut self.dispatch_rate,
        }
    }
}

/// Reads one figure from a JSON value.
///
/// Strings may carry thousands separators, currency and units: "10,000 MT"
/// and "USD 15,000/day" both read as numbers.
fn read_figure(value: &Value) -> Result<f64, Substitution> {
    let malformed = || Substitution::Malformed {
        value: value.to_string(),
    };
    match value {
        Value::Null => Err(Substitution::Missing),
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).ok_or_else(malformed),
        Value::String(s) if s.trim().is_empty() => Err(Substitution::Missing),
        Value::String(s) => parse_amount(s).ok_or_else(malformed),
        _ => Err(malformed()),
    }
}

/// Parses an amount written as text.
pub fn parse_amount(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return value.is_finite().then_some(value);
    }
    let digits: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn summary(value: &Value) -> VoyageSummary {
        VoyageSummary::from_value(value).unwrap()
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "parsed values are exact")]
    fn reads_document_labels_and_text_amounts() {
        let s = summary(&json!({
            "CARGO QTY": "10,000 MT",
            "LOAD/DISCH": 2000,
            "DEMURRAGE": "USD 15,000/day",
            "DISPATCH": "7,500.00",
            "PORT": "Kandla",
            "CARGO": "Coal"
        }));

        assert_eq!(s.cargo_quantity, 10_000.0);
        assert_eq!(s.rate_per_day, 2_000.0);
        assert_eq!(s.demurrage_rate, 15_000.0);
        assert_eq!(s.dispatch_rate, 7_500.0);
        assert!(s.issues.is_empty());
        assert_eq!(s.details.len(), 2);
        assert_eq!(s.details["PORT"], json!("Kandla"));
    }

    #[test]
    fn reads_canonical_keys() {
        let s = summary(&json!({
            "cargo_quantity": 10000,
            "rate_per_day": 2000,
            "demurrage_rate": 15000,
            "dispatch_rate": 7500
        }));
        assert_eq!(s, VoyageSummary::new(10_000.0, 2_000.0, 15_000.0, 7_500.0));
    }

    #[test]
    #[expect(clippy::float_cmp, reason = "substituted values are exactly zero")]
    fn bad_figures_default_to_zero_with_issue() {
        let s = summary(&json!({
            "cargo_quantity": "about a shipload",
            "rate_per_day": null,
            "demurrage_rate": -100
        }));

        assert_eq!(s.cargo_quantity, 0.0);
        assert_eq!(s.rate_per_day, 0.0);
        assert_eq!(s.demurrage_rate, 0.0);
        assert_eq!(s.dispatch_rate, 0.0);
        assert_eq!(
            s.issues
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            vec![
                "cargo quantity value \"about a shipload\" is not numeric, using 0.0",
                "load/discharge rate missing, using 0.0",
                "demurrage rate -100 is negative, using 0.0",
                "dispatch rate missing, using 0.0",
            ]
        );
    }

    #[test]
    fn non_objects_are_rejected() {
        let err = VoyageSummary::from_value(&json!([1, 2])).unwrap_err();
        assert_eq!(err.to_string(), "voyage summary must be a JSON object, got an array");
        assert!(VoyageSummary::from_value(&Value::Null).is_err());
    }

    #[test]
    fn parse_amount_shapes() {
        assert_eq!(parse_amount("1.5e3"), Some(1500.0));
        assert_eq!(parse_amount(" 12,500 "), Some(12_500.0));
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("3-4 days"), None);
        assert_eq!(parse_amount("inf"), None);
    }
}

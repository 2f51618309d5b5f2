//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A marker word contained more than one token.
    #[error("marker word must be a single word, got {value:?}")]
    NotASingleWord { value: String },

    /// A start/end pair used the same word on both sides.
    #[error("start and end markers must differ, both are {value:?}")]
    IdenticalMarkers { value: String },

    /// Unknown time bucket granularity.
    #[error("invalid bucket granularity: {value}")]
    InvalidGranularity { value: String },

    /// Unknown name match mode.
    #[error("invalid name match mode: {value}")]
    InvalidNameMatch { value: String },
}

/// Identifier of the source document an event was extracted from.
///
/// Upstream extraction frequently leaves this blank, so unlike the marker
/// words below an empty document ID is accepted and groups all such events
/// together.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a document ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A single lower-cased word used to recognise start or end actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarkerWord(String);

impl MarkerWord {
    /// Creates a marker word after validation. The word is lower-cased.
    pub fn new(word: impl Into<String>) -> Result<Self, ValidationError> {
        let word = word.into();
        let trimmed = word.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "marker word",
            });
        }
        if trimmed.split_whitespace().count() > 1 {
            return Err(ValidationError::NotASingleWord { value: word });
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the word as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MarkerWord {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MarkerWord> for String {
    fn from(word: MarkerWord) -> Self {
        word.0
    }
}

impl fmt::Display for MarkerWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MarkerWord {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_word_rejects_empty() {
        assert_eq!(
            MarkerWord::new("  ").unwrap_err(),
            ValidationError::Empty {
                field: "marker word"
            }
        );
        assert!(MarkerWord::new("commenced").is_ok());
    }

    #[test]
    fn marker_word_rejects_phrases() {
        let err = MarkerWord::new("hatch opened").unwrap_err();
        assert_eq!(err.to_string(), "marker word must be a single word, got \"hatch opened\"");
    }

    #[test]
    fn marker_word_is_lowercased() {
        let word = MarkerWord::new(" Commenced ").unwrap();
        assert_eq!(word.as_str(), "commenced");
    }

    #[test]
    fn marker_word_serde_roundtrip() {
        let word = MarkerWord::new("opened").unwrap();
        let json = serde_json::to_string(&word).unwrap();
        assert_eq!(json, "\"opened\"");
        let parsed: MarkerWord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, word);
    }

    #[test]
    fn marker_word_serde_rejects_empty() {
        let result: Result<MarkerWord, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn document_id_accepts_empty() {
        let id: DocumentId = serde_json::from_str("\"\"").unwrap();
        assert_eq!(id, DocumentId::default());
    }

    #[test]
    fn document_id_as_ref() {
        let id = DocumentId::new("sof-0822.pdf");
        let s: &str = id.as_ref();
        assert_eq!(s, "sof-0822.pdf");
    }
}

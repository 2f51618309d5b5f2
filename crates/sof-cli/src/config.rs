//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sof_core::dedup::DEFAULT_STOP_WORDS;
use sof_core::link::{DEFAULT_IGNORED_TOKENS, DEFAULT_LINK_PAIRS};
use sof_core::normalize::DEFAULT_LAYTIME_KEYWORDS;
use sof_core::{
    BucketGranularity, DedupConfig, LinkConfig, LinkPair, NameMatch, NormalizeConfig,
    PipelineConfig, ValidationError,
};

/// A start/end marker pair as written in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerPair {
    pub start: String,
    pub end: String,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Year for day/month dates when neither `--year` nor the request sets one.
    #[serde(default)]
    pub default_year: Option<i32>,

    /// Start/end verbs linked into intervals, tried in order.
    pub link_pairs: Vec<MarkerPair>,

    /// Words that never count as a shared subject when linking.
    pub link_ignored_tokens: Vec<String>,

    /// Words dropped from event names before duplicate comparison.
    pub dedup_stop_words: Vec<String>,

    /// Time bucket two duplicates must share.
    pub dedup_bucket: BucketGranularity,

    /// How names within one bucket are compared.
    pub dedup_name_match: NameMatch,

    /// Only drop duplicates found in the same document.
    #[serde(default)]
    pub dedup_per_document: bool,

    /// Keywords that mark an event as laytime when extraction gave no hint.
    pub laytime_keywords: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_year: None,
            link_pairs: DEFAULT_LINK_PAIRS
                .iter()
                .map(|(start, end)| MarkerPair {
                    start: (*start).to_string(),
                    end: (*end).to_string(),
                })
                .collect(),
            link_ignored_tokens: to_strings(DEFAULT_IGNORED_TOKENS),
            dedup_stop_words: to_strings(DEFAULT_STOP_WORDS),
            dedup_bucket: BucketGranularity::default(),
            dedup_name_match: NameMatch::default(),
            dedup_per_document: false,
            laytime_keywords: to_strings(DEFAULT_LAYTIME_KEYWORDS),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // SOF_DEFAULT_YEAR, SOF_DEDUP_BUCKET, ...
        figment = figment.merge(Env::prefixed("SOF_"));

        figment.extract()
    }

    /// Builds the pipeline settings for one request.
    pub fn pipeline(&self, default_year: i32) -> Result<PipelineConfig, ValidationError> {
        let pairs = self
            .link_pairs
            .iter()
            .map(|pair| LinkPair::new(&pair.start, &pair.end))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PipelineConfig {
            normalize: NormalizeConfig {
                default_year,
                laytime_keywords: lowercase(&self.laytime_keywords),
            },
            link: LinkConfig {
                pairs,
                ignored_tokens: lowercase(&self.link_ignored_tokens),
            },
            dedup: DedupConfig {
                stop_words: lowercase(&self.dedup_stop_words),
                bucket: self.dedup_bucket,
                name_match: self.dedup_name_match,
                per_document: self.dedup_per_document,
            },
        })
    }
}

fn to_strings(words: &[&str]) -> Vec<String> {
    words.iter().map(ToString::to_string).collect()
}

fn lowercase(words: &[String]) -> Vec<String> {
    words
        .iter()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Returns the platform-specific config directory for sof.
///
/// On Linux: `~/.config/sof`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sof"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_sof() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "sof");
    }

    #[test]
    fn test_default_config_matches_core_defaults() {
        let pipeline = Config::default().pipeline(2020).unwrap();
        assert_eq!(pipeline, PipelineConfig::new(2020));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sof.toml");
        std::fs::write(
            &path,
            r#"
default_year = 2019
dedup_bucket = "day"
dedup_name_match = "exact"
dedup_per_document = true
laytime_keywords = ["Shifting"]

[[link_pairs]]
start = "Commenced"
end = "Completed"
"#,
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.default_year, Some(2019));
        assert_eq!(config.dedup_bucket, BucketGranularity::Day);

        let pipeline = config.pipeline(2019).unwrap();
        assert_eq!(pipeline.normalize.laytime_keywords, vec!["shifting"]);
        assert_eq!(pipeline.dedup.name_match, NameMatch::Exact);
        assert!(pipeline.dedup.per_document);
        assert_eq!(pipeline.link.pairs, vec![LinkPair::new("commenced", "completed").unwrap()]);
    }

    #[test]
    fn test_invalid_marker_pair_is_rejected() {
        let config = Config {
            link_pairs: vec![MarkerPair {
                start: "commenced".to_string(),
                end: "all fast".to_string(),
            }],
            ..Config::default()
        };
        let err = config.pipeline(2020).unwrap_err();
        assert_eq!(err, ValidationError::NotASingleWord { value: "all fast".to_string() });
    }
}

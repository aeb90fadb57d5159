//! Analyzer configuration.
//!
//! Every tunable the pipeline consumes lives here as an explicit value
//! passed into the [`crate::pipeline::Analyzer`]; nothing is read from
//! process-wide state at analysis time. A YAML override file can adjust any
//! field.

use serde::{Deserialize, Serialize};

use crate::extract::DEFAULT_MIN_SENTENCE_LEN;
use crate::polarity::{
    CueListClassifier, PolarityClassifier, SentimentClassifier,
};
use crate::profile::{
    BACKSTORY_START_STRENGTH, STORY_START_STRENGTH, STRENGTH_INCREMENT,
};

/// Default dominance ratio: a conflict escalates only when contradicting
/// links reach half the supporting count. Tunable; the useful range is
/// roughly 0.3–0.5.
pub const DEFAULT_DOMINANCE_RATIO: f64 = 0.5;

/// Default cap on evidence passages retrieved for the oracle.
pub const DEFAULT_ORACLE_PASSAGES: usize = 10;

/// Which polarity strategy the extractors use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Cue-list heuristic (default).
    CueList,
    /// Compound-sentiment scorer.
    Sentiment,
}

impl ClassifierKind {
    /// Construct the configured strategy.
    pub fn build(&self) -> Box<dyn PolarityClassifier> {
        match self {
            ClassifierKind::CueList => Box::new(CueListClassifier::default()),
            ClassifierKind::Sentiment => Box::new(SentimentClassifier::default()),
        }
    }
}

/// Tunables for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Sentences shorter than this are skipped by the extractors.
    pub min_sentence_len: usize,
    /// Polarity strategy for both extractors.
    pub classifier: ClassifierKind,
    /// Start strength for story-derived constraints.
    pub story_start_strength: f64,
    /// Start strength for backstory-derived constraints.
    pub backstory_start_strength: f64,
    /// Per-unit strength increment.
    pub strength_increment: f64,
    /// Minimum contradicting/supporting ratio for a conflict to escalate to
    /// the final prediction.
    pub dominance_ratio: f64,
    /// Cap on evidence passages handed to the oracle.
    pub oracle_passages: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
            classifier: ClassifierKind::CueList,
            story_start_strength: STORY_START_STRENGTH,
            backstory_start_strength: BACKSTORY_START_STRENGTH,
            strength_increment: STRENGTH_INCREMENT,
            dominance_ratio: DEFAULT_DOMINANCE_RATIO,
            oracle_passages: DEFAULT_ORACLE_PASSAGES,
        }
    }
}

impl AnalyzerConfig {
    /// Load a config from a YAML document; missing fields take defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.story_start_strength, 0.1);
        assert_eq!(config.backstory_start_strength, 0.5);
        assert_eq!(config.strength_increment, 0.1);
        assert_eq!(config.dominance_ratio, 0.5);
        assert_eq!(config.classifier, ClassifierKind::CueList);
    }

    #[test]
    fn test_yaml_overrides_take_effect() {
        let config = AnalyzerConfig::from_yaml(
            "dominance_ratio: 0.3\nclassifier: sentiment\n",
        )
        .unwrap();
        assert_eq!(config.dominance_ratio, 0.3);
        assert_eq!(config.classifier, ClassifierKind::Sentiment);
        // Untouched fields keep their defaults.
        assert_eq!(config.min_sentence_len, DEFAULT_MIN_SENTENCE_LEN);
    }
}

//! Polarity classification for tagged text units.
//!
//! Two interchangeable strategies are shipped: a cue-list heuristic
//! ([`CueListClassifier`]) and a compound-sentiment scorer
//! ([`SentimentClassifier`]). Both are ordinary values constructed by the
//! caller and injected behind the [`PolarityClassifier`] trait; neither is a
//! process-wide singleton, so tests can run variants side-by-side.
//!
//! Neither strategy ever emits a neutral polarity: text that matches no cue
//! and scores inside the neutral band classifies as positive.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Polarity of a text unit along a behavioral dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Polarity::Positive => write!(f, "positive"),
            Polarity::Negative => write!(f, "negative"),
        }
    }
}

/// Strategy interface for polarity classification.
///
/// Implementations must be pure with respect to the input text: the same
/// text always classifies the same way.
pub trait PolarityClassifier: Send + Sync + fmt::Debug {
    fn classify(&self, text: &str) -> Polarity;
}

// ---------------------------------------------------------------------------
// Cue-list strategy
// ---------------------------------------------------------------------------

/// Cue-list polarity heuristic.
///
/// Negative cues are checked first; a sentence containing any negative cue is
/// negative regardless of positive cues. With no cue match the sentence
/// defaults to positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CueListClassifier {
    pub negative_cues: Vec<String>,
    pub positive_cues: Vec<String>,
}

impl Default for CueListClassifier {
    fn default() -> Self {
        fn owned(cues: &[&str]) -> Vec<String> {
            cues.iter().map(|c| c.to_string()).collect()
        }
        CueListClassifier {
            negative_cues: owned(&[
                "avoided",
                "refused",
                "questioned",
                "distrusted",
                "never",
                "not",
                "walked away",
                "chose peace",
                "defied",
                "rebelled",
                "scared",
                "terrified",
                "coward",
                "fear",
                "wrong",
                "evil",
                "dark",
                "guilt",
                "betray",
                "abandon",
            ]),
            positive_cues: owned(&[
                "enjoyed",
                "liked",
                "obeyed",
                "trusted",
                "relied",
                "followed",
                "respected",
                "fought willingly",
                "attacked",
                "brave",
                "courage",
                "bold",
                "hero",
                "right",
                "good",
                "light",
                "innocent",
                "loyal",
                "protect",
                "defend",
            ]),
        }
    }
}

impl PolarityClassifier for CueListClassifier {
    fn classify(&self, text: &str) -> Polarity {
        let lower = text.to_lowercase();
        if self.negative_cues.iter().any(|c| lower.contains(c.as_str())) {
            Polarity::Negative
        } else if self.positive_cues.iter().any(|c| lower.contains(c.as_str())) {
            Polarity::Positive
        } else {
            // Default is always positive, never neutral.
            Polarity::Positive
        }
    }
}

// ---------------------------------------------------------------------------
// Compound-sentiment strategy
// ---------------------------------------------------------------------------

/// Compound score at or below this value classifies as negative.
pub const DEFAULT_NEGATIVE_THRESHOLD: f64 = -0.05;

/// Normalization constant for the compound score (maps the raw valence sum
/// into `[-1, 1]`).
const NORMALIZATION_ALPHA: f64 = 15.0;

/// Scalar applied to a valence token preceded by a negator.
const NEGATION_SCALAR: f64 = -0.74;

/// How many preceding tokens are searched for a negator.
const NEGATION_WINDOW: usize = 3;

const NEGATORS: &[&str] = &[
    "not", "never", "no", "none", "neither", "nor", "cannot", "without",
];

/// Built-in valence table, tuned for narrative behavioral text.
static VALENCE: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| {
    let mut m = HashMap::new();
    // Violence / conflict
    m.insert("violence", -2.9);
    m.insert("violent", -2.6);
    m.insert("fight", -1.3);
    m.insert("fought", -1.3);
    m.insert("attack", -1.6);
    m.insert("attacked", -1.6);
    m.insert("battle", -1.6);
    m.insert("conflict", -1.6);
    m.insert("war", -2.9);
    m.insert("hurt", -1.8);
    m.insert("harm", -2.2);
    m.insert("kill", -3.2);
    m.insert("killed", -3.2);
    m.insert("peace", 2.5);
    m.insert("peaceful", 2.4);
    // Trust / bonds
    m.insert("trust", 1.6);
    m.insert("trusted", 1.9);
    m.insert("distrust", -1.8);
    m.insert("distrusted", -1.8);
    m.insert("betray", -2.2);
    m.insert("betrayed", -2.2);
    m.insert("friend", 2.2);
    m.insert("friends", 2.2);
    m.insert("enemy", -2.5);
    m.insert("bond", 1.4);
    m.insert("relied", 1.2);
    // Courage / fear
    m.insert("brave", 2.1);
    m.insert("courage", 2.2);
    m.insert("bold", 1.2);
    m.insert("hero", 2.6);
    m.insert("coward", -1.9);
    m.insert("fear", -2.2);
    m.insert("feared", -2.2);
    m.insert("scared", -1.9);
    m.insert("terrified", -2.7);
    // Loyalty
    m.insert("loyal", 2.2);
    m.insert("loyalty", 2.2);
    m.insert("protect", 1.9);
    m.insert("protected", 1.9);
    m.insert("defend", 1.2);
    m.insert("defended", 1.2);
    m.insert("abandon", -2.1);
    m.insert("abandoned", -2.1);
    m.insert("sacrifice", -0.9);
    // Morality
    m.insert("good", 1.9);
    m.insert("evil", -3.4);
    m.insert("wrong", -2.1);
    m.insert("innocent", 1.5);
    m.insert("guilt", -2.4);
    m.insert("guilty", -2.3);
    m.insert("cruel", -2.8);
    m.insert("kind", 2.4);
    m.insert("honest", 2.3);
    // Authority
    m.insert("obeyed", 0.4);
    m.insert("respected", 2.1);
    m.insert("defied", -1.0);
    m.insert("rebelled", -1.3);
    m.insert("refused", -1.3);
    m.insert("avoided", -1.0);
    // General affect
    m.insert("love", 3.2);
    m.insert("loved", 3.2);
    m.insert("hate", -2.7);
    m.insert("hated", -2.7);
    m.insert("happy", 2.7);
    m.insert("joy", 2.8);
    m.insert("sad", -2.1);
    m.insert("angry", -2.3);
    m.insert("anger", -2.3);
    m.insert("dark", -1.1);
    m.insert("death", -2.9);
    m.insert("enjoyed", 2.2);
    m.insert("liked", 1.8);
    m
});

/// Compound-sentiment polarity scorer.
///
/// Sums per-token valence (with short-window negation flipping) and squashes
/// the sum into `[-1, 1]`; text at or below the negative threshold is
/// negative, everything else positive.
#[derive(Debug, Clone)]
pub struct SentimentClassifier {
    negative_threshold: f64,
}

impl Default for SentimentClassifier {
    fn default() -> Self {
        SentimentClassifier {
            negative_threshold: DEFAULT_NEGATIVE_THRESHOLD,
        }
    }
}

impl SentimentClassifier {
    pub fn new(negative_threshold: f64) -> Self {
        SentimentClassifier { negative_threshold }
    }

    /// Compound sentiment score for `text`, in `[-1, 1]`.
    pub fn compound_score(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|t| {
                t.trim_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .filter(|t| !t.is_empty())
            .collect();

        let mut sum = 0.0;
        for (i, token) in tokens.iter().enumerate() {
            let Some(&valence) = VALENCE.get(token.as_str()) else {
                continue;
            };
            let window_start = i.saturating_sub(NEGATION_WINDOW);
            let negated = tokens[window_start..i]
                .iter()
                .any(|t| NEGATORS.contains(&t.as_str()));
            sum += if negated {
                valence * NEGATION_SCALAR
            } else {
                valence
            };
        }

        if sum == 0.0 {
            0.0
        } else {
            sum / (sum * sum + NORMALIZATION_ALPHA).sqrt()
        }
    }
}

impl PolarityClassifier for SentimentClassifier {
    fn classify(&self, text: &str) -> Polarity {
        if self.compound_score(text) <= self.negative_threshold {
            Polarity::Negative
        } else {
            Polarity::Positive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cue_list_negative_cue_wins() {
        let clf = CueListClassifier::default();
        // "trusted" is a positive cue, but "never" is negative and checked first.
        assert_eq!(clf.classify("He never trusted anyone."), Polarity::Negative);
    }

    #[test]
    fn test_cue_list_positive_cue() {
        let clf = CueListClassifier::default();
        assert_eq!(clf.classify("He trusted his friends."), Polarity::Positive);
    }

    #[test]
    fn test_cue_list_defaults_positive() {
        let clf = CueListClassifier::default();
        assert_eq!(clf.classify("The sun rose over the hills."), Polarity::Positive);
    }

    #[test]
    fn test_sentiment_clear_negative() {
        let clf = SentimentClassifier::default();
        assert_eq!(
            clf.classify("He hated the cruel, violent war."),
            Polarity::Negative
        );
    }

    #[test]
    fn test_sentiment_clear_positive() {
        let clf = SentimentClassifier::default();
        assert_eq!(
            clf.classify("He loved and trusted his loyal friends."),
            Polarity::Positive
        );
    }

    #[test]
    fn test_sentiment_neutral_defaults_positive() {
        let clf = SentimentClassifier::default();
        assert_eq!(clf.compound_score("The door opened slowly."), 0.0);
        assert_eq!(clf.classify("The door opened slowly."), Polarity::Positive);
    }

    #[test]
    fn test_sentiment_negation_flips_valence() {
        let clf = SentimentClassifier::default();
        let plain = clf.compound_score("He trusted them.");
        let negated = clf.compound_score("He never trusted them.");
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_strategies_are_swappable() {
        let strategies: Vec<Box<dyn PolarityClassifier>> = vec![
            Box::new(CueListClassifier::default()),
            Box::new(SentimentClassifier::default()),
        ];
        for clf in &strategies {
            // Both agree on clearly negative phrasing.
            assert_eq!(clf.classify("He never trusted anyone."), Polarity::Negative);
        }
    }
}

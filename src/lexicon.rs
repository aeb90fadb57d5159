//! Behavioral dimensions and the trigger-keyword lexicon.
//!
//! A [`Dimension`] is a fixed behavioral axis along which consistency is
//! judged. The closed set is declared here; the keywords that map raw text
//! onto a dimension live in a [`Lexicon`] value that is constructed
//! explicitly and passed into every extractor, so alternative keyword sets
//! can run side-by-side (e.g. in tests) without touching process-wide state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed behavioral axis.
///
/// Declaration order matters: extractors scan dimensions in this order and
/// tag a sentence with the first one that matches, so two overlapping
/// keyword lists always resolve to the earlier-declared dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// Attitudes toward violence, conflict, and physical confrontation.
    Violence,
    /// Relationship with authority figures, rules, and leadership.
    Authority,
    /// Patterns of trust, betrayal, and interpersonal bonds.
    Trust,
    /// Bravery, fear, and risk-facing behavior.
    Courage,
    /// Allegiance, protection, and abandonment.
    Loyalty,
    /// Moral judgment: right, wrong, good, evil.
    Morality,
}

impl Dimension {
    /// All dimensions in scan order.
    pub const ALL: [Dimension; 6] = [
        Dimension::Violence,
        Dimension::Authority,
        Dimension::Trust,
        Dimension::Courage,
        Dimension::Loyalty,
        Dimension::Morality,
    ];

    /// Lowercase label, matching the serde representation.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Violence => "violence",
            Dimension::Authority => "authority",
            Dimension::Trust => "trust",
            Dimension::Courage => "courage",
            Dimension::Loyalty => "loyalty",
            Dimension::Morality => "morality",
        }
    }

    /// Human-readable description used in dossier output.
    pub fn description(&self) -> &'static str {
        match self {
            Dimension::Violence => {
                "Attitudes and behaviors related to violence, conflict, and physical confrontation"
            }
            Dimension::Authority => {
                "Relationship with authority figures, rules, and leadership"
            }
            Dimension::Trust => {
                "Patterns of trust, loyalty, betrayal, and interpersonal bonds"
            }
            Dimension::Courage => "Bravery, fear, and willingness to face risk",
            Dimension::Loyalty => "Allegiance, protection, sacrifice, and abandonment",
            Dimension::Morality => "Moral judgment and the character's sense of right and wrong",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One lexicon entry: a dimension and its trigger keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub dimension: Dimension,
    pub keywords: Vec<String>,
}

/// Ordered mapping from dimension to trigger keywords.
///
/// Entry order is the scan order. The built-in table ([`Lexicon::default`])
/// covers all six dimensions; a custom table may cover fewer (dimensions
/// without an entry are simply never tagged).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lexicon {
    pub entries: Vec<LexiconEntry>,
}

impl Default for Lexicon {
    fn default() -> Self {
        fn entry(dimension: Dimension, keywords: &[&str]) -> LexiconEntry {
            LexiconEntry {
                dimension,
                keywords: keywords.iter().map(|k| k.to_string()).collect(),
            }
        }
        Lexicon {
            entries: vec![
                entry(
                    Dimension::Violence,
                    &["violence", "fight", "attack", "conflict", "battle", "hurt", "harm"],
                ),
                entry(
                    Dimension::Authority,
                    &["authority", "leader", "rule", "obey", "defy", "order", "command"],
                ),
                entry(
                    Dimension::Trust,
                    &["trust", "betray", "rely", "bond", "distrust", "friend", "loyal"],
                ),
                entry(
                    Dimension::Courage,
                    &["brave", "courage", "fear", "scared", "bold", "coward", "hero"],
                ),
                entry(
                    Dimension::Loyalty,
                    &["loyal", "betray", "abandon", "protect", "defend", "sacrifice"],
                ),
                entry(
                    Dimension::Morality,
                    &["right", "wrong", "evil", "good", "dark", "innocent", "guilt"],
                ),
            ],
        }
    }
}

impl Lexicon {
    /// Load a lexicon from a YAML document (a list of `{dimension, keywords}`
    /// entries, in scan order).
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        let entries: Vec<LexiconEntry> = serde_yaml::from_str(yaml)?;
        Ok(Lexicon { entries })
    }

    /// Tag a sentence with the first matching dimension, or `None`.
    ///
    /// Matching is case-insensitive substring containment; the caller may
    /// pass text in any case. First match wins across entries, so the result
    /// is deterministic for overlapping keyword lists.
    pub fn tag(&self, sentence: &str) -> Option<Dimension> {
        let lower = sentence.to_lowercase();
        for entry in &self.entries {
            if entry.keywords.iter().any(|kw| lower.contains(kw.as_str())) {
                return Some(entry.dimension);
            }
        }
        None
    }

    /// Keywords for one dimension, if present.
    pub fn keywords(&self, dimension: Dimension) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.dimension == dimension)
            .map(|e| e.keywords.as_slice())
    }
}

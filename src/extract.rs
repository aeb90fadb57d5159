//! Sentence-level extraction of claims and experiences.
//!
//! An [`Extractor`] splits a text into sentences, tags each sentence with at
//! most one behavioral dimension (first match wins, in lexicon scan order)
//! and a polarity, and assigns a deterministic content-derived identifier.
//! The same extractor serves both producers: backstory text yields *claims*
//! (no chapter scope) and narrative chunks yield *experiences* (scoped by
//! chapter index, so identical sentences in different chapters get distinct
//! ids while identical claim sentences dedupe to the same id).
//!
//! Extraction is a pure function of the input text plus the injected lexicon
//! and classifier. Sentences matching no dimension contribute nothing.

use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::lexicon::{Dimension, Lexicon};
use crate::polarity::{Polarity, PolarityClassifier};

/// Sentences shorter than this many characters are skipped.
pub const DEFAULT_MIN_SENTENCE_LEN: usize = 10;

/// Width of the hex-encoded unit identifier.
const ID_WIDTH: usize = 8;

/// Sentence boundary: terminal punctuation followed by whitespace.
static SENTENCE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// A single tagged textual unit: a claim (from backstory) or an experience
/// (from the narrative). Created once by an extractor pass, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedUnit {
    /// Deterministic content-derived identifier (8 hex chars).
    pub id: String,
    pub dimension: Dimension,
    pub polarity: Polarity,
    /// The sentence this unit was extracted from.
    pub text: String,
    /// Chapter/chunk index for experiences; `None` for claims.
    pub chapter: Option<usize>,
}

impl TaggedUnit {
    /// Whether this unit is a narrative experience (vs. a backstory claim).
    pub fn is_experience(&self) -> bool {
        self.chapter.is_some()
    }
}

/// Deterministic unit identifier: truncated md5 of the scope-qualified
/// sentence. Same text in the same scope always hashes to the same id;
/// collisions at this width are accepted as negligible.
pub fn unit_id(chapter: Option<usize>, text: &str) -> String {
    let mut hasher = Md5::new();
    match chapter {
        Some(ch) => hasher.update(format!("{}_{}", ch, text)),
        None => hasher.update(text),
    }
    let digest = hasher.finalize();
    hex::encode(digest)[..ID_WIDTH].to_string()
}

/// Split text into trimmed, non-empty sentences.
///
/// The boundary rule is terminal punctuation (`.`, `!`, `?`) followed by
/// whitespace; the punctuation stays with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        // The punctuation char is ASCII, so +1 lands on a char boundary.
        let end = boundary.start() + 1;
        sentences.push(text[start..end].trim());
        start = boundary.end();
    }
    if start < text.len() {
        sentences.push(text[start..].trim());
    }
    sentences.into_iter().filter(|s| !s.is_empty()).collect()
}

/// Sentence-level claim/experience extractor.
pub struct Extractor {
    lexicon: Lexicon,
    classifier: Box<dyn PolarityClassifier>,
    min_sentence_len: usize,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("entries", &self.lexicon.entries.len())
            .field("min_sentence_len", &self.min_sentence_len)
            .finish()
    }
}

impl Extractor {
    pub fn new(lexicon: Lexicon, classifier: Box<dyn PolarityClassifier>) -> Self {
        Extractor {
            lexicon,
            classifier,
            min_sentence_len: DEFAULT_MIN_SENTENCE_LEN,
        }
    }

    pub fn with_min_sentence_len(mut self, min_sentence_len: usize) -> Self {
        self.min_sentence_len = min_sentence_len;
        self
    }

    /// The lexicon this extractor tags with.
    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Classify the polarity of a raw sentence with this extractor's strategy.
    pub fn classify(&self, text: &str) -> Polarity {
        self.classifier.classify(text)
    }

    /// Extract claims from declarative backstory text.
    pub fn extract_claims(&self, backstory: &str) -> Vec<TaggedUnit> {
        self.extract(backstory, None)
    }

    /// Extract experiences from one narrative chunk.
    pub fn extract_experiences(&self, chunk: &str, chapter: usize) -> Vec<TaggedUnit> {
        self.extract(chunk, Some(chapter))
    }

    /// Extract experiences across all chunks, numbering chapters from 1.
    pub fn detect_experiences(&self, chunks: &[String]) -> Vec<TaggedUnit> {
        chunks
            .iter()
            .enumerate()
            .flat_map(|(i, chunk)| self.extract_experiences(chunk, i + 1))
            .collect()
    }

    fn extract(&self, text: &str, chapter: Option<usize>) -> Vec<TaggedUnit> {
        let mut units = Vec::new();
        for sentence in split_sentences(text) {
            if sentence.len() < self.min_sentence_len {
                continue;
            }
            let Some(dimension) = self.lexicon.tag(sentence) else {
                continue;
            };
            units.push(TaggedUnit {
                id: unit_id(chapter, sentence),
                dimension,
                polarity: self.classifier.classify(sentence),
                text: sentence.to_string(),
                chapter,
            });
        }
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polarity::CueListClassifier;

    fn extractor() -> Extractor {
        Extractor::new(Lexicon::default(), Box::new(CueListClassifier::default()))
    }

    #[test]
    fn test_split_sentences_on_terminal_punctuation() {
        let sentences = split_sentences("He ran. She followed! Did they arrive? Yes");
        assert_eq!(
            sentences,
            vec!["He ran.", "She followed!", "Did they arrive?", "Yes"]
        );
    }

    #[test]
    fn test_extract_trust_claim() {
        let units = extractor().extract_claims("He trusted his friends completely.");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].dimension, Dimension::Trust);
        assert_eq!(units[0].polarity, Polarity::Positive);
        assert_eq!(units[0].chapter, None);
    }

    #[test]
    fn test_short_sentences_are_skipped() {
        let units = extractor().extract_claims("He hurt. But he never fought another battle.");
        // "He hurt." is below the minimum length; only the second sentence tags.
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].dimension, Dimension::Violence);
        assert_eq!(units[0].polarity, Polarity::Negative);
    }

    #[test]
    fn test_unmatched_sentences_are_discarded() {
        let units = extractor().extract_claims("The morning was cold and grey outside.");
        assert!(units.is_empty());
    }

    #[test]
    fn test_one_dimension_per_sentence() {
        // Both violence ("fight") and courage ("brave") keywords appear;
        // violence is declared first and wins.
        let units = extractor().extract_claims("The brave man joined the fight at dawn.");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].dimension, Dimension::Violence);
    }

    #[test]
    fn test_claim_id_is_deterministic() {
        let ex = extractor();
        let a = ex.extract_claims("He trusted his friends completely.");
        let b = ex.extract_claims("He trusted his friends completely.");
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[0].id.len(), 8);
    }

    #[test]
    fn test_experience_ids_differ_across_chapters() {
        let ex = extractor();
        let ch1 = ex.extract_experiences("He refused to fight the soldiers.", 1);
        let ch2 = ex.extract_experiences("He refused to fight the soldiers.", 2);
        assert_ne!(ch1[0].id, ch2[0].id);
        // Same sentence in the same chapter hashes identically.
        let ch1_again = ex.extract_experiences("He refused to fight the soldiers.", 1);
        assert_eq!(ch1[0].id, ch1_again[0].id);
    }

    #[test]
    fn test_claim_and_experience_scopes_differ() {
        assert_ne!(
            unit_id(None, "He trusted his friends."),
            unit_id(Some(1), "He trusted his friends.")
        );
    }

    #[test]
    fn test_detect_experiences_numbers_chapters_from_one() {
        let chunks = vec![
            "A battle broke out in the square.".to_string(),
            "He obeyed the commander without question.".to_string(),
        ];
        let units = extractor().detect_experiences(&chunks);
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].chapter, Some(1));
        assert_eq!(units[1].chapter, Some(2));
    }
}

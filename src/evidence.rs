//! Evidence linking between narrative excerpts and backstory claims.
//!
//! The linker works from the full unit sets, not the aggregated profiles:
//! each experience is re-tagged from its raw text (the profile's constraint
//! polarity may have been overwritten by later evidence) and paired with
//! every claim sharing its dimension. Links are recomputed on every
//! comparison run and never cached.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::extract::{Extractor, TaggedUnit};
use crate::lexicon::Dimension;
use crate::polarity::Polarity;
use crate::profile::Profile;

/// Excerpt text stored on a link is truncated to this many characters.
const MAX_EXCERPT_LEN: usize = 500;

/// At most this many links are carried per dimension in the aggregate.
pub const MAX_LINKS_PER_DIMENSION: usize = 10;

/// How an excerpt relates to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Supports,
    Contradicts,
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relationship::Supports => write!(f, "supports"),
            Relationship::Contradicts => write!(f, "contradicts"),
        }
    }
}

/// A scored pairing of one narrative excerpt with one backstory claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceLink {
    pub experience_id: String,
    pub claim_id: String,
    pub chapter: Option<usize>,
    pub dimension: Dimension,
    pub relationship: Relationship,
    pub experience_polarity: Polarity,
    pub claim_polarity: Polarity,
    pub experience_text: String,
    pub claim_text: String,
    pub confidence: f64,
    pub analysis: String,
}

/// Token-overlap confidence score in `[0.5, 1.0]`, rounded to two decimals.
///
/// `0.5 + 0.5 × |shared| / max(|experience|, |claim|)` over lowercase
/// whitespace tokens; 0.5 when either side has no tokens.
pub fn link_confidence(experience_text: &str, claim_text: &str) -> f64 {
    let experience_tokens: HashSet<String> = experience_text
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();
    let claim_tokens: HashSet<String> = claim_text
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.to_string())
        .collect();

    let max_len = experience_tokens.len().max(claim_tokens.len());
    if max_len == 0 {
        return 0.5;
    }
    let overlap = experience_tokens.intersection(&claim_tokens).count();
    let score = 0.5 + 0.5 * (overlap as f64 / max_len as f64);
    (score.min(1.0) * 100.0).round() / 100.0
}

fn support_analysis(dimension: Dimension, polarity: Polarity) -> String {
    format!(
        "This excerpt demonstrates {} {} behavior that aligns with the backstory claim. \
         The narrative evidence shows consistency in the character's established patterns \
         regarding {}.",
        polarity, dimension, dimension
    )
}

fn contradiction_analysis(
    dimension: Dimension,
    experience_polarity: Polarity,
    claim_polarity: Polarity,
) -> String {
    format!(
        "CONFLICT DETECTED: The excerpt shows {} {} behavior, but the backstory indicates \
         {} {}. This represents a fundamental inconsistency between the character's stated \
         history and their behavior in the narrative.",
        experience_polarity, dimension, claim_polarity, dimension
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Derive all experience/claim links.
///
/// Experiences are re-classified from their raw text with the extractor's
/// own matching rule; experiences that no longer tag a dimension are
/// skipped.
pub fn link_evidence(
    extractor: &Extractor,
    experiences: &[TaggedUnit],
    claims: &[TaggedUnit],
) -> Vec<EvidenceLink> {
    let mut links = Vec::new();
    for experience in experiences {
        let Some(dimension) = extractor.lexicon().tag(&experience.text) else {
            continue;
        };
        let experience_polarity = extractor.classify(&experience.text);

        for claim in claims.iter().filter(|c| c.dimension == dimension) {
            let (relationship, analysis) = if experience_polarity == claim.polarity {
                (
                    Relationship::Supports,
                    support_analysis(dimension, experience_polarity),
                )
            } else {
                (
                    Relationship::Contradicts,
                    contradiction_analysis(dimension, experience_polarity, claim.polarity),
                )
            };
            links.push(EvidenceLink {
                experience_id: experience.id.clone(),
                claim_id: claim.id.clone(),
                chapter: experience.chapter,
                dimension,
                relationship,
                experience_polarity,
                claim_polarity: claim.polarity,
                experience_text: truncate(&experience.text, MAX_EXCERPT_LEN),
                claim_text: claim.text.clone(),
                confidence: link_confidence(&experience.text, &claim.text),
                analysis,
            });
        }
    }
    links
}

/// Per-dimension link statistics for the dossier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionReport {
    pub dimension: Dimension,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_polarity: Option<Polarity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory_polarity: Option<Polarity>,
    pub total_links: usize,
    pub supporting_count: usize,
    pub contradicting_count: usize,
    pub is_conflict: bool,
    /// Top links, capped at [`MAX_LINKS_PER_DIMENSION`].
    pub links: Vec<EvidenceLink>,
}

/// Aggregate links per dimension, in declaration order.
///
/// Dimensions with no links are omitted. `is_conflict` is true as soon as a
/// single contradicting link exists; weighing contradiction against support
/// (the dominance rule) is the decision layer's job, not the linker's.
pub fn aggregate_links(
    links: &[EvidenceLink],
    story: &Profile,
    backstory: &Profile,
) -> Vec<DimensionReport> {
    let mut reports = Vec::new();
    for dimension in Dimension::ALL {
        let dim_links: Vec<&EvidenceLink> =
            links.iter().filter(|l| l.dimension == dimension).collect();
        if dim_links.is_empty() {
            continue;
        }
        let supporting_count = dim_links
            .iter()
            .filter(|l| l.relationship == Relationship::Supports)
            .count();
        let contradicting_count = dim_links.len() - supporting_count;
        reports.push(DimensionReport {
            dimension,
            description: dimension.description().to_string(),
            story_polarity: story.constraint(dimension).map(|c| c.polarity),
            backstory_polarity: backstory.constraint(dimension).map(|c| c.polarity),
            total_links: dim_links.len(),
            supporting_count,
            contradicting_count,
            is_conflict: contradicting_count > 0,
            links: dim_links
                .into_iter()
                .take(MAX_LINKS_PER_DIMENSION)
                .cloned()
                .collect(),
        });
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::unit_id;
    use crate::lexicon::Lexicon;
    use crate::polarity::CueListClassifier;
    use crate::profile::ProfileUpdater;

    fn extractor() -> Extractor {
        Extractor::new(Lexicon::default(), Box::new(CueListClassifier::default()))
    }

    fn experience(text: &str, chapter: usize) -> TaggedUnit {
        let ex = extractor();
        let mut units = ex.extract_experiences(text, chapter);
        assert_eq!(units.len(), 1, "fixture should extract one unit: {}", text);
        units.remove(0)
    }

    fn claim(text: &str) -> TaggedUnit {
        let ex = extractor();
        let mut units = ex.extract_claims(text);
        assert_eq!(units.len(), 1, "fixture should extract one unit: {}", text);
        units.remove(0)
    }

    // "violent" is not a lexicon trigger (only "violence" is), so this claim
    // arrives pre-tagged, the way an upstream producer would hand it over.
    fn violent_temper_claim() -> TaggedUnit {
        let text = "He was known for his violent temper.";
        TaggedUnit {
            id: unit_id(None, text),
            dimension: Dimension::Violence,
            polarity: Polarity::Positive,
            text: text.to_string(),
            chapter: None,
        }
    }

    #[test]
    fn test_opposite_polarities_contradict() {
        let exp = experience("He refused to fight.", 3);
        let cl = violent_temper_claim();
        let links = link_evidence(&extractor(), &[exp], &[cl]);
        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_eq!(link.dimension, Dimension::Violence);
        assert_eq!(link.relationship, Relationship::Contradicts);
        assert_eq!(link.experience_polarity, Polarity::Negative);
        assert_eq!(link.claim_polarity, Polarity::Positive);
        assert_eq!(link.chapter, Some(3));
        // Shared tokens: {"he"} out of max 7 claim tokens.
        assert_eq!(link.confidence, 0.57);
    }

    #[test]
    fn test_matching_polarities_support() {
        let exp = experience("He trusted his friends completely.", 1);
        let cl = claim("He always trusted the people around him, bonded for life.");
        let links = link_evidence(&extractor(), &[exp], &[cl]);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].relationship, Relationship::Supports);
    }

    #[test]
    fn test_claims_in_other_dimensions_are_not_linked() {
        let exp = experience("He refused to fight.", 1);
        let cl = claim("He obeyed every command from his leader.");
        let links = link_evidence(&extractor(), &[exp], &[cl]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_confidence_bounds() {
        assert_eq!(link_confidence("", ""), 0.5);
        assert_eq!(link_confidence("alpha beta", ""), 0.5);
        // Identical texts share every token.
        assert_eq!(link_confidence("he fought a battle", "he fought a battle"), 1.0);
    }

    #[test]
    fn test_confidence_is_rounded_to_two_decimals() {
        // 1 shared token of max 3: 0.5 + 0.5/3 = 0.666... -> 0.67
        assert_eq!(link_confidence("fight", "fight him now"), 0.67);
    }

    #[test]
    fn test_aggregate_counts_and_conflict_flag() {
        let ex = extractor();
        let experiences = vec![
            experience("He refused to fight.", 1),
            experience("He attacked the guards at the battle.", 2),
        ];
        let claims = vec![violent_temper_claim()];
        let links = link_evidence(&ex, &experiences, &claims);
        assert_eq!(links.len(), 2);

        let story = ProfileUpdater::for_story().fold(&experiences);
        let backstory = ProfileUpdater::for_backstory().fold(&claims);
        let reports = aggregate_links(&links, &story, &backstory);
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.dimension, Dimension::Violence);
        assert_eq!(report.total_links, 2);
        assert_eq!(report.supporting_count, 1);
        assert_eq!(report.contradicting_count, 1);
        assert!(report.is_conflict);
        assert_eq!(report.backstory_polarity, Some(Polarity::Positive));
    }

    #[test]
    fn test_links_are_recomputed_from_raw_text() {
        // Hand-build an experience whose stored polarity disagrees with its
        // text; the linker must trust the text, not the stored tag.
        let text = "He refused to fight.";
        let exp = TaggedUnit {
            id: unit_id(Some(1), text),
            dimension: Dimension::Violence,
            polarity: Polarity::Positive,
            text: text.to_string(),
            chapter: Some(1),
        };
        let cl = violent_temper_claim();
        let links = link_evidence(&extractor(), &[exp], &[cl]);
        assert_eq!(links[0].experience_polarity, Polarity::Negative);
        assert_eq!(links[0].relationship, Relationship::Contradicts);
    }
}

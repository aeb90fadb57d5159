//! Dossier assembly.
//!
//! The dossier is the structured aggregate handed to renderers and other
//! downstream consumers: run metadata, the extracted claims, per-dimension
//! link statistics, the conflict list, and a human-readable summary.
//! Rendering and persistence live in [`crate::report`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compare::{ConflictRecord, Decision, Verdict};
use crate::evidence::{DimensionReport, EvidenceLink};
use crate::extract::TaggedUnit;

/// Run-level counters and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DossierMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_excerpts_analyzed: usize,
    pub total_backstory_claims: usize,
    pub total_evidence_links: usize,
}

/// The complete evidence dossier for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dossier {
    pub metadata: DossierMetadata,
    pub verdict: Verdict,
    /// 1 = consistent, 0 = inconsistent.
    pub prediction: u8,
    pub reason: String,
    pub backstory_claims: Vec<TaggedUnit>,
    pub dimension_analysis: Vec<DimensionReport>,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: String,
}

/// Assemble the dossier from the run's computed parts.
pub fn build_dossier(
    experiences: &[TaggedUnit],
    claims: &[TaggedUnit],
    links: &[EvidenceLink],
    dimension_analysis: Vec<DimensionReport>,
    decision: &Decision,
) -> Dossier {
    let summary = summarize(decision, &dimension_analysis, links.len());
    Dossier {
        metadata: DossierMetadata {
            generated_at: Utc::now(),
            total_excerpts_analyzed: experiences.len(),
            total_backstory_claims: claims.len(),
            total_evidence_links: links.len(),
        },
        verdict: decision.verdict,
        prediction: decision.prediction(),
        reason: decision.reason.clone(),
        backstory_claims: claims.to_vec(),
        dimension_analysis,
        conflicts: decision.conflicts.clone(),
        summary,
    }
}

fn summarize(decision: &Decision, reports: &[DimensionReport], total_links: usize) -> String {
    match decision.verdict {
        Verdict::Consistent => format!(
            "CONSISTENT: The backstory claims are supported by the narrative evidence. \
             Analysis of {} excerpt-claim linkages across {} behavioral dimensions shows \
             alignment between the character's stated history and their actions in the story.",
            total_links,
            reports.len()
        ),
        Verdict::Inconsistent => {
            let conflict_dims: Vec<&str> = reports
                .iter()
                .filter(|r| r.is_conflict)
                .map(|r| r.dimension.label())
                .collect();
            format!(
                "INCONSISTENT: Conflicts detected in {} dimension(s): {}. The backstory \
                 claims contradict behavioral evidence found in the narrative. See detailed \
                 analysis below for specific excerpts and explanations.",
                conflict_dims.len(),
                conflict_dims.join(", ")
            )
        }
    }
}

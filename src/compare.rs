//! Profile comparison and conflict detection.
//!
//! The comparator walks the dimensions present in *both* profiles and
//! records a conflict wherever the two polarities disagree. It never
//! mutates either input and produces an ephemeral [`Decision`]; nothing is
//! persisted back into a profile.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lexicon::Dimension;
use crate::polarity::Polarity;
use crate::profile::Profile;

/// A conflict is high severity when the stronger of the two constraints is
/// at or above this strength.
pub const HIGH_SEVERITY_THRESHOLD: f64 = 0.5;

/// Conflict severity.
///
/// `Low` is only ever produced by the synthesized "general" record on the
/// defensive repair path; the comparator itself emits `Medium` or `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// The polarity and strength of one side of a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub polarity: Polarity,
    pub strength: f64,
}

/// One dimension-level disagreement between the two profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// `None` marks the synthesized "general" conflict.
    pub dimension: Option<Dimension>,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story: Option<ConstraintSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backstory: Option<ConstraintSummary>,
    pub explanation: String,
}

impl ConflictRecord {
    /// Label for reporting: the dimension name, or `"general"`.
    pub fn dimension_label(&self) -> &str {
        self.dimension.map(|d| d.label()).unwrap_or("general")
    }

    fn general() -> Self {
        ConflictRecord {
            dimension: None,
            severity: Severity::Low,
            story: None,
            backstory: None,
            explanation: "Backstory constraints are incompatible with accumulated story \
                          constraints, even though exact polarity matches were sparse."
                .to_string(),
        }
    }
}

/// Overall comparison outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Consistent,
    Inconsistent,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Consistent => write!(f, "consistent"),
            Verdict::Inconsistent => write!(f, "inconsistent"),
        }
    }
}

/// Structured comparison decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub verdict: Verdict,
    pub conflicts: Vec<ConflictRecord>,
    /// The intersection of dimensions examined, stated explicitly so a
    /// consistent decision reports what was checked rather than staying
    /// silent.
    pub checked_dimensions: Vec<Dimension>,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_summary: Option<String>,
}

impl Decision {
    /// Binary prediction: 1 = consistent, 0 = inconsistent.
    pub fn prediction(&self) -> u8 {
        match self.verdict {
            Verdict::Consistent => 1,
            Verdict::Inconsistent => 0,
        }
    }

    /// Repair the "inconsistent with zero conflicts" edge case.
    ///
    /// Downstream consumers assume `inconsistent ⇒ conflicts non-empty`, so
    /// a generic low-severity record is synthesized instead of surfacing an
    /// empty list.
    pub fn ensure_conflicts_nonempty(&mut self) {
        if self.verdict == Verdict::Inconsistent && self.conflicts.is_empty() {
            self.conflicts.push(ConflictRecord::general());
        }
    }
}

/// Compare the story-derived and backstory-derived profiles.
///
/// For every dimension present in both profiles, a polarity mismatch yields
/// a [`ConflictRecord`]; severity is [`Severity::High`] when the stronger
/// side is at or above [`HIGH_SEVERITY_THRESHOLD`], otherwise
/// [`Severity::Medium`]. The verdict is inconsistent iff at least one
/// conflict was found.
pub fn compare(story: &Profile, backstory: &Profile) -> Decision {
    let mut conflicts = Vec::new();
    let mut checked_dimensions = Vec::new();

    for (dimension, story_con) in &story.constraints {
        let Some(back_con) = backstory.constraint(*dimension) else {
            continue;
        };
        checked_dimensions.push(*dimension);
        if story_con.polarity == back_con.polarity {
            continue;
        }
        let max_strength = story_con.strength.max(back_con.strength);
        let severity = if max_strength >= HIGH_SEVERITY_THRESHOLD {
            Severity::High
        } else {
            Severity::Medium
        };
        conflicts.push(ConflictRecord {
            dimension: Some(*dimension),
            severity,
            story: Some(ConstraintSummary {
                polarity: story_con.polarity,
                strength: story_con.strength,
            }),
            backstory: Some(ConstraintSummary {
                polarity: back_con.polarity,
                strength: back_con.strength,
            }),
            explanation: format!(
                "Story shows {} {} while backstory shows {}.",
                story_con.polarity, dimension, back_con.polarity
            ),
        });
    }

    let mut decision = if conflicts.is_empty() {
        Decision {
            verdict: Verdict::Consistent,
            conflicts,
            checked_dimensions,
            reason: "No conflicting constraints were found between story and backstory."
                .to_string(),
            trigger_summary: None,
        }
    } else {
        let summary = format!("{} conflicts detected.", conflicts.len());
        Decision {
            verdict: Verdict::Inconsistent,
            conflicts,
            checked_dimensions,
            reason: "One or more constraint conflicts exceeded severity thresholds."
                .to_string(),
            trigger_summary: Some(summary),
        }
    };
    decision.ensure_conflicts_nonempty();
    decision
}

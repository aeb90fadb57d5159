//! Behavioral profiles and the incremental update rule.
//!
//! A [`Profile`] accumulates per-dimension belief state from a stream of
//! tagged units. Updates are pure: [`ProfileUpdater::update`] returns a new
//! profile value and the caller threads state explicitly, so folding a full
//! sequence is exactly equivalent to applying updates one at a time in
//! order. Profiles are never rolled back and never merged with each other;
//! the two profiles of an analysis run are only ever compared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::extract::TaggedUnit;
use crate::lexicon::Dimension;
use crate::polarity::Polarity;

/// Strength a story-derived constraint starts at ("one weak narrative hint").
pub const STORY_START_STRENGTH: f64 = 0.1;

/// Strength a backstory-derived constraint starts at ("one strong backstory
/// claim"). The asymmetry with [`STORY_START_STRENGTH`] is deliberate.
pub const BACKSTORY_START_STRENGTH: f64 = 0.5;

/// Strength added per additional unit of evidence on the same dimension.
pub const STRENGTH_INCREMENT: f64 = 0.1;

/// Accumulated belief about one behavioral dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub dimension: Dimension,
    /// Polarity of the *most recently folded* unit for this dimension.
    ///
    /// Deliberately last-write-wins, not averaged: late evidence flips the
    /// recorded polarity even though strength keeps accumulating. Output
    /// parity with the established behavior depends on this policy.
    pub polarity: Polarity,
    /// Evidence weight in `[0, 1]`; non-decreasing as evidence arrives.
    pub strength: f64,
    /// Ids of every unit folded into this constraint, in arrival order.
    pub evidence_ids: Vec<String>,
}

/// Per-dimension belief state for one information source (story or
/// backstory). A dimension absent from `constraints` has no evidence; that
/// is not a neutral assertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub constraints: BTreeMap<Dimension, Constraint>,
    /// Every folded unit id, in arrival order (append-only).
    pub history: Vec<String>,
}

impl Profile {
    pub fn new() -> Self {
        Profile::default()
    }

    pub fn constraint(&self, dimension: Dimension) -> Option<&Constraint> {
        self.constraints.get(&dimension)
    }

    /// Dimensions with at least one observed unit, in declaration order.
    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.constraints.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

/// The merge rule that folds tagged units into a profile.
///
/// The start strength differs by producer: incremental experience folding
/// uses [`STORY_START_STRENGTH`], one-shot backstory parsing uses
/// [`BACKSTORY_START_STRENGTH`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProfileUpdater {
    pub start_strength: f64,
    pub increment: f64,
}

impl ProfileUpdater {
    pub fn new(start_strength: f64, increment: f64) -> Self {
        ProfileUpdater {
            start_strength,
            increment,
        }
    }

    /// Updater for narrative experiences.
    pub fn for_story() -> Self {
        ProfileUpdater::new(STORY_START_STRENGTH, STRENGTH_INCREMENT)
    }

    /// Updater for backstory claims.
    pub fn for_backstory() -> Self {
        ProfileUpdater::new(BACKSTORY_START_STRENGTH, STRENGTH_INCREMENT)
    }

    /// Fold one unit into `profile`, returning the updated profile.
    pub fn update(&self, profile: &Profile, unit: &TaggedUnit) -> Profile {
        let mut next = profile.clone();
        next.history.push(unit.id.clone());

        match next.constraints.get_mut(&unit.dimension) {
            Some(constraint) => {
                // Polarity is overwritten, strength only accumulates.
                constraint.polarity = unit.polarity;
                constraint.strength = (constraint.strength + self.increment).min(1.0);
                constraint.evidence_ids.push(unit.id.clone());
            }
            None => {
                next.constraints.insert(
                    unit.dimension,
                    Constraint {
                        dimension: unit.dimension,
                        polarity: unit.polarity,
                        strength: self.start_strength,
                        evidence_ids: vec![unit.id.clone()],
                    },
                );
            }
        }
        next
    }

    /// Fold an ordered sequence of units over an empty profile.
    ///
    /// Equivalent to repeated [`ProfileUpdater::update`] in the same order;
    /// callers rely on this for reproducibility.
    pub fn fold(&self, units: &[TaggedUnit]) -> Profile {
        units
            .iter()
            .fold(Profile::new(), |profile, unit| self.update(&profile, unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, dimension: Dimension, polarity: Polarity) -> TaggedUnit {
        TaggedUnit {
            id: id.to_string(),
            dimension,
            polarity,
            text: format!("unit {}", id),
            chapter: Some(1),
        }
    }

    #[test]
    fn test_first_unit_creates_constraint_at_start_strength() {
        let story = ProfileUpdater::for_story();
        let p = story.update(
            &Profile::new(),
            &unit("a1", Dimension::Violence, Polarity::Negative),
        );
        let c = p.constraint(Dimension::Violence).unwrap();
        assert_eq!(c.strength, STORY_START_STRENGTH);
        assert_eq!(c.polarity, Polarity::Negative);
        assert_eq!(c.evidence_ids, vec!["a1"]);
        assert_eq!(p.history, vec!["a1"]);
    }

    #[test]
    fn test_backstory_start_strength_is_higher() {
        let back = ProfileUpdater::for_backstory();
        let p = back.update(
            &Profile::new(),
            &unit("c1", Dimension::Trust, Polarity::Positive),
        );
        assert_eq!(
            p.constraint(Dimension::Trust).unwrap().strength,
            BACKSTORY_START_STRENGTH
        );
    }

    #[test]
    fn test_strength_is_monotone_and_capped() {
        let story = ProfileUpdater::for_story();
        let mut profile = Profile::new();
        let mut last = 0.0;
        for i in 0..20 {
            let u = unit(&format!("u{}", i), Dimension::Courage, Polarity::Positive);
            profile = story.update(&profile, &u);
            let strength = profile.constraint(Dimension::Courage).unwrap().strength;
            assert!(strength >= last, "strength decreased at step {}", i);
            assert!(strength <= 1.0, "strength exceeded cap at step {}", i);
            last = strength;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_late_evidence_overwrites_polarity() {
        let story = ProfileUpdater::for_story();
        let units = vec![
            unit("a", Dimension::Violence, Polarity::Positive),
            unit("b", Dimension::Violence, Polarity::Negative),
        ];
        let p = story.fold(&units);
        let c = p.constraint(Dimension::Violence).unwrap();
        assert_eq!(c.polarity, Polarity::Negative);
        // Strength still accumulated across both units.
        assert!((c.strength - (STORY_START_STRENGTH + STRENGTH_INCREMENT)).abs() < 1e-9);
        assert_eq!(c.evidence_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_fold_is_deterministic() {
        let story = ProfileUpdater::for_story();
        let units = vec![
            unit("a", Dimension::Violence, Polarity::Negative),
            unit("b", Dimension::Trust, Polarity::Positive),
            unit("c", Dimension::Violence, Polarity::Negative),
        ];
        assert_eq!(story.fold(&units), story.fold(&units));
    }

    #[test]
    fn test_fold_matches_unit_by_unit_updates() {
        let story = ProfileUpdater::for_story();
        let units = vec![
            unit("a", Dimension::Loyalty, Polarity::Positive),
            unit("b", Dimension::Loyalty, Polarity::Negative),
            unit("c", Dimension::Morality, Polarity::Positive),
        ];
        let mut stepped = Profile::new();
        for u in &units {
            stepped = story.update(&stepped, u);
        }
        assert_eq!(story.fold(&units), stepped);
    }

    #[test]
    fn test_unmentioned_dimension_has_no_constraint() {
        let story = ProfileUpdater::for_story();
        let p = story.fold(&[unit("a", Dimension::Trust, Polarity::Positive)]);
        assert!(p.constraint(Dimension::Violence).is_none());
    }
}

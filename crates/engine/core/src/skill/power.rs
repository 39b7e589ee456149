//! Cached skill power ratings.
//!
//! Ratings order skills for NPC selection and client sorting; they are never
//! used for damage. The cache is process-wide and protected by a mutex, with
//! per-skill and global invalidation.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{CostKind, Skill, SkillImpact};
use crate::state::SkillId;

/// Rates skills and memoizes the results.
#[derive(Debug, Default)]
pub struct SkillPowerEngine {
    cache: Mutex<HashMap<SkillId, f64>>,
}

impl SkillPowerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Power rating of a skill, from cache when warm.
    pub fn rating(&self, skill: &Skill) -> f64 {
        if let Ok(cache) = self.cache.lock() {
            if let Some(rating) = cache.get(&skill.id) {
                return *rating;
            }
        }

        let rating = rate(skill);

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(skill.id, rating);
        }
        rating
    }

    /// Drops the cached rating for one skill.
    pub fn invalidate(&self, skill: SkillId) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.remove(&skill);
        }
    }

    /// Drops every cached rating.
    pub fn invalidate_all(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

/// Rates a skill: per-impact ratings summed, then scaled by cost efficiency.
fn rate(skill: &Skill) -> f64 {
    let impact_sum: f64 = skill.impacts.iter().map(rate_impact).sum();
    if impact_sum <= 0.0 {
        return 0.0;
    }

    let base_sum: f64 = skill.impacts.iter().map(|i| i.formula.base.abs()).sum();
    let energy_cost = (skill.cost(CostKind::Energy) as f64).max(1.0);
    let ap_cost = (skill.cost(CostKind::ActionPoints) as f64).max(1.0);

    // Geometric mean of energy efficiency and AP efficiency.
    let efficiency = ((base_sum / energy_cost) * (base_sum / ap_cost)).sqrt();

    impact_sum * efficiency
}

/// Per-impact rating: `base · (1 + scaling_potential)` with the potential
/// clamped to `[0, 2]`.
fn rate_impact(impact: &SkillImpact) -> f64 {
    let formula = &impact.formula;
    let base = formula.base.abs();

    let avg_coefficient = if formula.scaling.is_empty() {
        0.0
    } else {
        formula.scaling.iter().map(|(_, c)| c).sum::<f64>() / formula.scaling.len() as f64
    };

    let scaling_potential =
        ((formula.max_efficiency - 1.0) * (1.0 + avg_coefficient)).clamp(0.0, 2.0);

    base * (1.0 + scaling_potential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{ImpactFormula, ImpactKind, SkillCost, SkillType, Violation};
    use crate::stats::StatKind;

    fn attack_skill(base: f64, max_efficiency: f64, energy: i32, ap: i32) -> Skill {
        Skill {
            id: SkillId::new(),
            name: "strike".into(),
            grade: 5,
            skill_type: SkillType::Attack,
            school: None,
            costs: vec![
                SkillCost {
                    kind: CostKind::Energy,
                    value: energy,
                },
                SkillCost {
                    kind: CostKind::ActionPoints,
                    value: ap,
                },
            ],
            impacts: vec![SkillImpact {
                kind: ImpactKind::Damage,
                violation: Violation::Physical,
                formula: ImpactFormula {
                    base,
                    requires: vec![],
                    scaling: vec![(StatKind::PhysicalStrength, 0.5)],
                    max_efficiency,
                },
            }],
            effects: vec![],
            special: None,
        }
    }

    #[test]
    fn higher_scaling_ceiling_rates_higher() {
        let engine = SkillPowerEngine::new();
        let weak = attack_skill(10.0, 1.0, 10, 2);
        let strong = attack_skill(10.0, 2.0, 10, 2);
        assert!(engine.rating(&strong) > engine.rating(&weak));
    }

    #[test]
    fn cheaper_skill_rates_higher() {
        let engine = SkillPowerEngine::new();
        let cheap = attack_skill(10.0, 1.5, 5, 1);
        let costly = attack_skill(10.0, 1.5, 40, 4);
        assert!(engine.rating(&cheap) > engine.rating(&costly));
    }

    #[test]
    fn invalidation_recomputes() {
        let engine = SkillPowerEngine::new();
        let mut skill = attack_skill(10.0, 1.5, 10, 2);
        let first = engine.rating(&skill);

        // Template change without invalidation keeps serving the stale value.
        skill.impacts[0].formula.base = 30.0;
        assert_eq!(engine.rating(&skill), first);

        engine.invalidate(skill.id);
        assert!(engine.rating(&skill) > first);
    }
}

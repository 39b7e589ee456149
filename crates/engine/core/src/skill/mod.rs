//! Skill templates: costs, impact formulas, effect assignments.
//!
//! A skill is static content; everything evaluated at perform time (scaling,
//! luck multiplier, shield interaction) happens in the impact resolver.

mod power;

pub use power::SkillPowerEngine;

use crate::effect::EffectKind;
use crate::state::SkillId;
use crate::stats::{StatBlock, StatKind};

/// Skill archetypes, dispatched by the Use-Skill handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SkillType {
    Attack,
    Defense,
    Heal,
    Buff,
    Debuff,
    Utility,
    Special,
}

/// Resource debited when an action is accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CostKind {
    ActionPoints,
    Energy,
    Health,
}

/// One `(kind, value)` cost entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SkillCost {
    pub kind: CostKind,
    pub value: i32,
}

/// Impact category; shields are keyed by violation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Violation {
    Physical,
    Mental,
    Energy,
    Heat,
    Cold,
    Light,
    Darkness,
}

/// What an impact does to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ImpactKind {
    /// Reduces target HP through shields.
    Damage,
    /// Restores target HP (negative damage, skips shields).
    Heal,
    /// Establishes or refreshes a shield on the target.
    Shield,
    /// Drains target energy through shields.
    EnergyDamage,
    /// Restores target energy.
    EnergyRestore,
    /// Emitted by the resolver when a target drops to 0 HP.
    KnockOut,
}

impl ImpactKind {
    /// Aggressive impacts start fights when performed against co-located
    /// targets.
    pub const fn is_aggressive(&self) -> bool {
        matches!(self, Self::Damage | Self::EnergyDamage | Self::KnockOut)
    }

    /// Energy-class impacts apply to `current_energy` instead of HP.
    pub const fn targets_energy(&self) -> bool {
        matches!(self, Self::EnergyDamage | Self::EnergyRestore)
    }
}

/// Scaling formula: `size = base + Σ coefficient · stat`, clipped by
/// `max_efficiency · base`. Unmet requirements drop the scaling entirely.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ImpactFormula {
    pub base: f64,
    /// `(stat, minimum)` gates; all must hold for scaling to apply.
    pub requires: Vec<(StatKind, i32)>,
    /// `(stat, coefficient)` contributions.
    pub scaling: Vec<(StatKind, f64)>,
    /// Cap expressed as a multiple of `base`.
    pub max_efficiency: f64,
}

impl ImpactFormula {
    pub fn flat(base: f64) -> Self {
        Self {
            base,
            requires: Vec::new(),
            scaling: Vec::new(),
            max_efficiency: 1.0,
        }
    }

    /// Evaluates against the initiator's effective stats.
    pub fn evaluate(&self, stats: &StatBlock) -> f64 {
        let requirements_met = self
            .requires
            .iter()
            .all(|(kind, min)| stats.effective(*kind) >= *min);
        if !requirements_met {
            return self.base;
        }

        let scaled: f64 = self
            .scaling
            .iter()
            .map(|(kind, coefficient)| stats.effective(*kind) as f64 * coefficient)
            .sum();

        let cap = self.max_efficiency * self.base;
        (self.base + scaled).min(cap)
    }
}

/// One `(kind, violation, formula)` impact entry.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SkillImpact {
    pub kind: ImpactKind,
    pub violation: Violation,
    pub formula: ImpactFormula,
}

/// Effect a skill may attach to its targets.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectAssignment {
    pub effect: EffectKind,
    /// Success chance in `[0, 1]`, gated by a d100 at assignment time.
    pub base_chance: f64,
    /// Duration formula evaluated against the initiator's stats.
    pub ends_in: ImpactFormula,
}

/// Special skills resolved through the sub-registry instead of impacts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SpecialSkillKind {
    TeleportToSafeZone,
    FlowAccumulation,
    ResetStats,
    GroupTeleport,
    EnergyTransfer,
}

/// A skill template.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    /// Grade 0 (max) to 10 (min); lower is more powerful.
    pub grade: u8,
    pub skill_type: SkillType,
    /// School this skill belongs to; learners must know the school.
    pub school: Option<String>,
    pub costs: Vec<SkillCost>,
    pub impacts: Vec<SkillImpact>,
    pub effects: Vec<EffectAssignment>,
    /// Set when `skill_type == Special`.
    pub special: Option<SpecialSkillKind>,
}

impl Skill {
    pub fn cost(&self, kind: CostKind) -> i32 {
        self.costs
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.value)
            .sum()
    }

    /// Returns true when any impact is aggressive.
    pub fn is_aggressive(&self) -> bool {
        self.impacts.iter().any(|i| i.kind.is_aggressive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula() -> ImpactFormula {
        ImpactFormula {
            base: 10.0,
            requires: vec![(StatKind::PhysicalStrength, 5)],
            scaling: vec![(StatKind::PhysicalStrength, 0.2)],
            max_efficiency: 2.0,
        }
    }

    #[test]
    fn scaling_applies_when_requirements_met() {
        let mut stats = StatBlock::new();
        stats.set_base(StatKind::PhysicalStrength, 20);
        assert_eq!(formula().evaluate(&stats), 14.0);
    }

    #[test]
    fn unmet_requirement_falls_back_to_base() {
        let mut stats = StatBlock::new();
        stats.set_base(StatKind::PhysicalStrength, 3);
        assert_eq!(formula().evaluate(&stats), 10.0);
    }

    #[test]
    fn scaling_is_clipped_by_max_efficiency() {
        let mut stats = StatBlock::new();
        stats.set_base(StatKind::PhysicalStrength, 500);
        assert_eq!(formula().evaluate(&stats), 20.0);
    }
}

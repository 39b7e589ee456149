//! Impact resolution: damage, heals, and shields.
//!
//! Every resolved impact appends rows to the campaign's append-only journal;
//! the journal is the replay record for the cycle.

use crate::action::ActionError;
use crate::dice::DiceRollResult;
use crate::shield::ActiveShield;
use crate::skill::{ImpactKind, SkillImpact, Violation};
use crate::state::{ActionId, CampaignState, CharacterId};

/// One journal row: the recorded outcome of a resolution step.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionImpact {
    pub action: ActionId,
    pub target: CharacterId,
    pub kind: ImpactKind,
    pub violation: Violation,
    pub size: i32,
    /// True when this row records damage soaked by a shield.
    pub to_shield: bool,
    pub dice: Option<DiceRollResult>,
    pub cycle: u64,
}

/// Resolves a skill's (or item's) impact list against a list of targets.
///
/// Per impact: evaluate the formula against the initiator's stats, apply the
/// luck multiplier, round, then apply to each active target through its
/// shields. A killing blow on a Critical Fail resurrects the target to 1 HP
/// instead of knocking it out.
pub fn resolve_impacts(
    state: &mut CampaignState,
    action: ActionId,
    initiator: CharacterId,
    impacts: &[SkillImpact],
    targets: &[CharacterId],
    roll: DiceRollResult,
) -> Result<(), ActionError> {
    let cycle = state.current_cycle();
    let initiator_stats = state
        .character(initiator)
        .ok_or(ActionError::InitiatorNotFound)?
        .stats
        .clone();

    for impact in impacts {
        let raw = impact.formula.evaluate(&initiator_stats);
        let size = (raw * roll.multiplier).round() as i32;

        for &target_id in targets {
            let active = state
                .character(target_id)
                .map(|c| c.is_active)
                .unwrap_or(false);
            if !active {
                continue;
            }
            apply_to_target(state, action, target_id, impact, size, roll, cycle);
        }
    }

    Ok(())
}

/// Applies one sized impact to one target, journaling every step.
fn apply_to_target(
    state: &mut CampaignState,
    action: ActionId,
    target_id: CharacterId,
    impact: &SkillImpact,
    size: i32,
    roll: DiceRollResult,
    cycle: u64,
) {
    match impact.kind {
        ImpactKind::Shield => {
            raise_shield(state, target_id, impact.violation, size, roll);
            state.record_impact(ActionImpact {
                action,
                target: target_id,
                kind: ImpactKind::Shield,
                violation: impact.violation,
                size,
                to_shield: false,
                dice: Some(roll),
                cycle,
            });
        }

        ImpactKind::Heal => {
            // Heals are negative damage.
            let healed = heal_target(state, target_id, size);
            state.record_impact(ActionImpact {
                action,
                target: target_id,
                kind: ImpactKind::Heal,
                violation: impact.violation,
                size: healed,
                to_shield: false,
                dice: Some(roll),
                cycle,
            });
        }

        ImpactKind::EnergyRestore => {
            let restored = restore_energy(state, target_id, size);
            state.record_impact(ActionImpact {
                action,
                target: target_id,
                kind: ImpactKind::EnergyRestore,
                violation: impact.violation,
                size: restored,
                to_shield: false,
                dice: Some(roll),
                cycle,
            });
        }

        ImpactKind::Damage | ImpactKind::EnergyDamage | ImpactKind::KnockOut => {
            let (to_shield, to_target) =
                soak_through_shield(state, target_id, impact.violation, size);

            if to_shield > 0 {
                state.record_impact(ActionImpact {
                    action,
                    target: target_id,
                    kind: impact.kind,
                    violation: impact.violation,
                    size: to_shield,
                    to_shield: true,
                    dice: Some(roll),
                    cycle,
                });
            }

            state.record_impact(ActionImpact {
                action,
                target: target_id,
                kind: impact.kind,
                violation: impact.violation,
                size: to_target,
                to_shield: false,
                dice: Some(roll),
                cycle,
            });

            let knocked_out = deal_residual(state, target_id, impact.kind, to_target, roll);
            if knocked_out {
                state.record_impact(ActionImpact {
                    action,
                    target: target_id,
                    kind: ImpactKind::KnockOut,
                    violation: impact.violation,
                    size: 0,
                    to_shield: false,
                    dice: Some(roll),
                    cycle,
                });
            }
        }
    }
}

/// Upserts the target's shield for the violation kind: health is set to the
/// impact size, lifetime to `min(dice_side, 5)` unconditionally.
fn raise_shield(
    state: &mut CampaignState,
    target_id: CharacterId,
    violation: Violation,
    size: i32,
    roll: DiceRollResult,
) {
    if let Some(target) = state.character_mut(target_id) {
        target
            .shields
            .insert(violation, ActiveShield::raise(violation, size, roll.dice_side));
    }
}

/// Passes damage through the matching shield, if any.
///
/// Returns `(damage_to_shield, damage_to_target)`. Overflow past a broken
/// shield passes through to the target; the broken shield is destroyed.
fn soak_through_shield(
    state: &mut CampaignState,
    target_id: CharacterId,
    violation: Violation,
    size: i32,
) -> (i32, i32) {
    let Some(target) = state.character_mut(target_id) else {
        return (0, size);
    };
    let Some(shield) = target.shields.get_mut(&violation) else {
        return (0, size);
    };

    let efficiency = shield.efficiency();
    let mut to_target = (size as f64 * (1.0 - efficiency)).round() as i32;
    let mut to_shield = size - to_target;

    shield.health -= to_shield;
    if shield.health < 0 {
        // Overflow past the shield reaches the target.
        let overflow = -shield.health;
        to_shield -= overflow;
        to_target += overflow;
        target.shields.remove(&violation);
    }

    (to_shield, to_target)
}

/// Applies residual damage to HP or energy; returns true on a knock-out.
fn deal_residual(
    state: &mut CampaignState,
    target_id: CharacterId,
    kind: ImpactKind,
    amount: i32,
    roll: DiceRollResult,
) -> bool {
    let Some(target) = state.character_mut(target_id) else {
        return false;
    };

    if kind.targets_energy() {
        target.current_energy -= amount;
        if target.current_energy < 0 {
            target.current_energy = 0;
        }
        return false;
    }

    target.current_hp -= amount;
    if target.current_hp <= 0 {
        if roll.is_critical_fail() {
            // A fumbled killing blow leaves the target barely standing.
            target.current_hp = 1;
            return false;
        }
        return true;
    }
    false
}

/// Heals the target, clamped to max HP. Returns the effective amount.
fn heal_target(state: &mut CampaignState, target_id: CharacterId, size: i32) -> i32 {
    let Some(target) = state.character_mut(target_id) else {
        return 0;
    };
    let max = target.max_hp();
    let before = target.current_hp;
    target.current_hp = (before + size).min(max);
    target.current_hp - before
}

/// Restores energy, clamped to the dimension-scaled maximum.
fn restore_energy(state: &mut CampaignState, target_id: CharacterId, size: i32) -> i32 {
    let Some(target) = state.character(target_id) else {
        return 0;
    };
    let max = target.max_energy(state.dimension_of(target));
    let Some(target) = state.character_mut(target_id) else {
        return 0;
    };
    let before = target.current_energy;
    target.current_energy = (before + size).min(max);
    target.current_energy - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RollOutcome;
    use crate::skill::ImpactFormula;
    use crate::state::{Campaign, Character, Coordinates, Position};
    use crate::stats::StatKind;

    fn base_roll() -> DiceRollResult {
        DiceRollResult {
            dice_side: 10,
            multiplier: 1.0,
            outcome: RollOutcome::BaseValue,
        }
    }

    fn setup() -> (CampaignState, CharacterId, CharacterId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let position = state
            .positions
            .insert(Position::new("arena", Coordinates::new(0, 0, 0)));
        let dimension = state.default_dimension;

        let mut attacker = Character::new("a", dimension);
        attacker.position = Some(position);
        attacker.stats.set_base(StatKind::PhysicalStrength, 20);
        attacker.stats.set_base(StatKind::Luck, 10);
        let attacker_id = state.add_character(attacker);

        let mut defender = Character::new("b", dimension);
        defender.position = Some(position);
        defender.current_hp = 100;
        let defender_id = state.add_character(defender);

        (state, attacker_id, defender_id)
    }

    fn attack_impact(base: f64) -> SkillImpact {
        SkillImpact {
            kind: ImpactKind::Damage,
            violation: Violation::Physical,
            formula: ImpactFormula {
                base,
                requires: vec![],
                scaling: vec![(StatKind::PhysicalStrength, 0.2)],
                max_efficiency: 2.0,
            },
        }
    }

    #[test]
    fn attack_without_shield_hits_hp() {
        // Scenario: base 10, PhysStrength 20 scaling 0.2, base-value roll.
        let (mut state, attacker, defender) = setup();
        let action = ActionId::new();

        resolve_impacts(
            &mut state,
            action,
            attacker,
            &[attack_impact(10.0)],
            &[defender],
            base_roll(),
        )
        .unwrap();

        assert_eq!(state.character(defender).unwrap().current_hp, 100 - 14);
        let rows: Vec<_> = state.impacts.iter().filter(|i| !i.to_shield).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].size, 14);
    }

    #[test]
    fn shield_soaks_by_efficiency_band() {
        // Shield at 70 health: level 3, efficiency 0.9. Incoming 40.
        let (mut state, attacker, defender) = setup();
        state
            .character_mut(defender)
            .unwrap()
            .shields
            .insert(Violation::Physical, ActiveShield::raise(Violation::Physical, 70, 20));

        let impact = SkillImpact {
            kind: ImpactKind::Damage,
            violation: Violation::Physical,
            formula: ImpactFormula::flat(40.0),
        };
        resolve_impacts(
            &mut state,
            ActionId::new(),
            attacker,
            &[impact],
            &[defender],
            base_roll(),
        )
        .unwrap();

        let target = state.character(defender).unwrap();
        assert_eq!(target.current_hp, 96);
        let shield = target.shields[&Violation::Physical];
        assert_eq!(shield.health, 34);
        assert_eq!(shield.level(), 2);
    }

    #[test]
    fn critical_fail_killing_blow_resurrects() {
        let (mut state, attacker, defender) = setup();
        state.character_mut(defender).unwrap().current_hp = 5;

        let roll = DiceRollResult {
            dice_side: 1,
            multiplier: 0.5,
            outcome: RollOutcome::CriticalFail,
        };
        let impact = SkillImpact {
            kind: ImpactKind::Damage,
            violation: Violation::Physical,
            formula: ImpactFormula::flat(12.0),
        };
        resolve_impacts(
            &mut state,
            ActionId::new(),
            attacker,
            &[impact],
            &[defender],
            roll,
        )
        .unwrap();

        assert_eq!(state.character(defender).unwrap().current_hp, 1);
        assert!(!state.impacts.iter().any(|i| i.kind == ImpactKind::KnockOut));
    }

    #[test]
    fn killing_blow_journals_knock_out() {
        let (mut state, attacker, defender) = setup();
        state.character_mut(defender).unwrap().current_hp = 5;

        let impact = SkillImpact {
            kind: ImpactKind::Damage,
            violation: Violation::Physical,
            formula: ImpactFormula::flat(12.0),
        };
        resolve_impacts(
            &mut state,
            ActionId::new(),
            attacker,
            &[impact],
            &[defender],
            base_roll(),
        )
        .unwrap();

        assert!(state.character(defender).unwrap().current_hp <= 0);
        assert!(state.impacts.iter().any(|i| i.kind == ImpactKind::KnockOut));
    }

    #[test]
    fn heal_flips_sign_and_clamps() {
        let (mut state, attacker, defender) = setup();
        state.character_mut(defender).unwrap().current_hp = 90;

        let impact = SkillImpact {
            kind: ImpactKind::Heal,
            violation: Violation::Energy,
            formula: ImpactFormula::flat(50.0),
        };
        resolve_impacts(
            &mut state,
            ActionId::new(),
            attacker,
            &[impact],
            &[defender],
            base_roll(),
        )
        .unwrap();

        let target = state.character(defender).unwrap();
        assert_eq!(target.current_hp, target.max_hp().min(140));
    }
}

//! Effect assignment and deactivation.

use rand::Rng;

use super::{ActiveEffect, EffectKind, EffectTemplate};
use crate::action::ActionError;
use crate::skill::EffectAssignment;
use crate::state::{ActiveEffectId, CampaignState, CharacterId};
use crate::stats::StatModifier;

/// Attempts to assign an effect to a target.
///
/// The attempt is gated by a d100 against the assignment's base chance and
/// fails silently when the roll misses. On success the active effect is
/// upserted (one per kind per target) and the template's stat modifiers are
/// evaluated against the initiator's stats and linked to it.
pub fn assign_effect(
    state: &mut CampaignState,
    initiator: Option<CharacterId>,
    target: CharacterId,
    assignment: &EffectAssignment,
    rng: &mut dyn rand::RngCore,
) -> Result<Option<ActiveEffectId>, ActionError> {
    let roll = rng.gen_range(1..=100);
    if !gate_passes(roll, assignment.base_chance) {
        return Ok(None);
    }

    let evaluator = initiator.unwrap_or(target);
    let stats = state
        .character(evaluator)
        .ok_or(ActionError::InitiatorNotFound)?
        .stats
        .clone();

    let template = state
        .effect_templates
        .get(&assignment.effect)
        .cloned()
        .unwrap_or_else(|| EffectTemplate::new(assignment.effect));

    let evaluated = assignment.ends_in.evaluate(&stats).round() as i64;
    let ends_in = if evaluated > 0 {
        evaluated as u32
    } else {
        template.ends_in.unwrap_or(1)
    };

    let modifier_values: Vec<(crate::stats::StatKind, i32)> = template
        .modifiers
        .iter()
        .map(|(kind, formula)| (*kind, formula.evaluate(&stats).round() as i32))
        .collect();

    let effect_id = upsert_active_effect(state, target, &template, ends_in)
        .ok_or(ActionError::TargetNotFound)?;

    if let Some(character) = state.character_mut(target) {
        for (kind, value) in modifier_values {
            character.stats.upsert_modifier(StatModifier {
                kind,
                value,
                source_effect: Some(effect_id),
            });
        }
    }

    Ok(Some(effect_id))
}

/// Assignment gate: the d100 must land at or above `100 − chance·100`.
fn gate_passes(roll: u32, base_chance: f64) -> bool {
    (roll as f64) >= 100.0 - base_chance * 100.0
}

/// Assigns an effect unconditionally, bypassing the dice gate.
///
/// Used by the pipeline itself (Knocked-Out in post, Coma on promotion).
pub fn force_assign(
    state: &mut CampaignState,
    target: CharacterId,
    kind: EffectKind,
    ends_in: u32,
) -> Option<ActiveEffectId> {
    let template = state
        .effect_templates
        .get(&kind)
        .cloned()
        .unwrap_or_else(|| EffectTemplate::new(kind));
    upsert_active_effect(state, target, &template, ends_in)
}

fn upsert_active_effect(
    state: &mut CampaignState,
    target: CharacterId,
    template: &EffectTemplate,
    ends_in: u32,
) -> Option<ActiveEffectId> {
    let character = state.character_mut(target)?;

    if let Some(existing) = character
        .effects
        .iter_mut()
        .find(|e| e.active && e.kind == template.kind)
    {
        // Re-application refreshes the clock.
        existing.duration = 0;
        existing.ends_in = ends_in;
        existing.impact = template.per_cycle;
        return Some(existing.id);
    }

    let effect = ActiveEffect {
        id: ActiveEffectId::new(),
        kind: template.kind,
        duration: 0,
        ends_in,
        permanent: template.permanent,
        impact: template.per_cycle,
        active: true,
    };
    let id = effect.id;
    character.effects.push(effect);
    Some(id)
}

/// Marks an active effect inactive and garbage-collects its stat modifiers.
pub fn deactivate_effect(state: &mut CampaignState, target: CharacterId, effect: ActiveEffectId) {
    if let Some(character) = state.character_mut(target) {
        if let Some(active) = character.effects.iter_mut().find(|e| e.id == effect) {
            active.active = false;
        }
        character.stats.remove_effect_modifiers(effect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::ImpactFormula;
    use crate::state::{Campaign, Character};
    use crate::stats::StatKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (CampaignState, CharacterId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let dimension = state.default_dimension;
        let target = state.add_character(Character::new("t", dimension));
        (state, target)
    }

    fn assignment(chance: f64) -> EffectAssignment {
        EffectAssignment {
            effect: EffectKind::Slowness,
            base_chance: chance,
            ends_in: ImpactFormula::flat(3.0),
        }
    }

    #[test]
    fn certain_assignment_applies_and_links_modifiers() {
        let (mut state, target) = setup();
        let mut template = EffectTemplate::new(EffectKind::Slowness);
        template.modifiers = vec![(StatKind::Speed, ImpactFormula::flat(-4.0))];
        state.effect_templates.insert(EffectKind::Slowness, template);

        let mut rng = StdRng::seed_from_u64(1);
        let effect = assign_effect(&mut state, None, target, &assignment(1.0), &mut rng)
            .unwrap()
            .expect("chance 1.0 always assigns");

        let character = state.character(target).unwrap();
        assert!(character.has_effect(EffectKind::Slowness));
        assert_eq!(character.stats.effective(StatKind::Speed), -4);

        deactivate_effect(&mut state, target, effect);
        let character = state.character(target).unwrap();
        assert!(!character.has_effect(EffectKind::Slowness));
        // Modifier garbage-collection: nothing references the effect anymore.
        assert!(character.stats.modifiers().is_empty());
    }

    #[test]
    fn gate_thresholds() {
        // 60% chance: rolls of 40 and above pass.
        assert!(!gate_passes(39, 0.6));
        assert!(gate_passes(40, 0.6));
        assert!(gate_passes(1, 1.0));
        assert!(!gate_passes(99, 0.0));
    }

    #[test]
    fn reassignment_refreshes_clock() {
        let (mut state, target) = setup();
        let first = force_assign(&mut state, target, EffectKind::Burning, 4).unwrap();
        state
            .character_mut(target)
            .unwrap()
            .effects
            .iter_mut()
            .for_each(|e| e.duration = 3);

        let second = force_assign(&mut state, target, EffectKind::Burning, 6).unwrap();
        assert_eq!(first, second);

        let character = state.character(target).unwrap();
        let effect = character.effects.iter().find(|e| e.id == first).unwrap();
        assert_eq!(effect.duration, 0);
        assert_eq!(effect.ends_in, 6);
    }
}

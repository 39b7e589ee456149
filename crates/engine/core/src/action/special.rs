//! Special-skill sub-registry.
//!
//! Skills typed `Special` do not resolve through the impact pipeline; each
//! maps to a named behavior invoked with the skill's dice roll. A Critical
//! Fail cancels the behavior before it runs (the costs stay spent).

use std::collections::HashMap;

use super::{Action, ActionError};
use crate::dice::DiceRollResult;
use crate::effect::deactivate_effect;
use crate::skill::SpecialSkillKind;
use crate::state::{CampaignState, CharacterId, PositionId, DEFAULT_SAFE_COORDINATES};

/// Behavior of one special skill kind.
pub trait SpecialHandler: Send + Sync {
    fn kind(&self) -> SpecialSkillKind;

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        roll: DiceRollResult,
    ) -> Result<(), ActionError>;
}

/// Keyed registry of special-skill behaviors.
pub struct SpecialRegistry {
    handlers: HashMap<SpecialSkillKind, Box<dyn SpecialHandler>>,
}

impl SpecialRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TeleportToSafeZone));
        registry.register(Box::new(FlowAccumulation));
        registry.register(Box::new(ResetStats));
        registry.register(Box::new(GroupTeleport));
        registry.register(Box::new(EnergyTransfer));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn SpecialHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    /// Invokes the behavior for `kind`. A Critical Fail roll is a no-op.
    pub fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        kind: SpecialSkillKind,
        roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        if roll.is_critical_fail() {
            tracing::debug!(action = %action.id, ?kind, "special skill fizzled on critical fail");
            return Ok(());
        }
        let handler = self
            .handlers
            .get(&kind)
            .ok_or(ActionError::HandlerNotFound)?;
        handler.invoke(state, action, roll)
    }
}

impl Default for SpecialRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// The character's safe position: last recorded, else the default safe node.
fn safe_position_of(state: &CampaignState, character: CharacterId) -> Option<PositionId> {
    state
        .character(character)
        .and_then(|c| c.last_safe_position)
        .or_else(|| state.positions.find_by_coordinates(DEFAULT_SAFE_COORDINATES))
}

// ============================================================================
// Built-in special skills
// ============================================================================

pub struct TeleportToSafeZone;

impl SpecialHandler for TeleportToSafeZone {
    fn kind(&self) -> SpecialSkillKind {
        SpecialSkillKind::TeleportToSafeZone
    }

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        let destination = safe_position_of(state, action.initiator);
        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.position = destination;
        Ok(())
    }
}

/// Gathers ambient flow: restores `0.7 · max_energy · multiplier`, clamped.
pub struct FlowAccumulation;

impl SpecialHandler for FlowAccumulation {
    fn kind(&self) -> SpecialSkillKind {
        SpecialSkillKind::FlowAccumulation
    }

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        let character = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        let max = character.max_energy(state.dimension_of(character));
        let gained = (max as f64 * 0.7 * roll.multiplier).round() as i32;

        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.current_energy = (character.current_energy + gained).min(max);
        Ok(())
    }
}

/// Flags the initiator for a base-stat reset; the next cycle's prepare phase
/// settles it.
pub struct ResetStats;

impl SpecialHandler for ResetStats {
    fn kind(&self) -> SpecialSkillKind {
        SpecialSkillKind::ResetStats
    }

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.resetting_base_stats = true;

        // Lingering effects end with the reset; their modifiers go with them.
        let effects: Vec<_> = character
            .active_effects()
            .filter(|e| !e.kind.is_incapacitating())
            .map(|e| e.id)
            .collect();
        for effect in effects {
            deactivate_effect(state, action.initiator, effect);
        }
        Ok(())
    }
}

/// Moves the initiator and every target to the action's position.
pub struct GroupTeleport;

impl SpecialHandler for GroupTeleport {
    fn kind(&self) -> SpecialSkillKind {
        SpecialSkillKind::GroupTeleport
    }

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        let destination = action.position.ok_or(ActionError::PositionRequired)?;
        if !state.positions.contains(destination) {
            return Err(ActionError::PositionNotFound);
        }

        let mut movers = action.targets.clone();
        movers.push(action.initiator);
        for mover in movers {
            if let Some(character) = state.character_mut(mover) {
                character.position = Some(destination);
            }
        }
        Ok(())
    }
}

/// Transfers energy from the initiator to the single target, scaled by the
/// roll and capped by what the initiator has left.
pub struct EnergyTransfer;

impl SpecialHandler for EnergyTransfer {
    fn kind(&self) -> SpecialSkillKind {
        SpecialSkillKind::EnergyTransfer
    }

    fn invoke(
        &self,
        state: &mut CampaignState,
        action: &Action,
        roll: DiceRollResult,
    ) -> Result<(), ActionError> {
        let target_id = match action.targets.as_slice() {
            [target] => *target,
            _ => {
                return Err(ActionError::InvalidPayload(
                    "exactly one target required".into(),
                ))
            }
        };

        let requested = action
            .data
            .as_ref()
            .and_then(|d| d.get("amount"))
            .and_then(|a| a.as_i64())
            .unwrap_or(10) as i32;
        let scaled = (requested as f64 * roll.multiplier).round() as i32;

        let available = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .current_energy;
        let transferred = scaled.min(available).max(0);

        let target = state
            .character(target_id)
            .ok_or(ActionError::TargetNotFound)?;
        let target_max = target.max_energy(state.dimension_of(target));

        if let Some(initiator) = state.character_mut(action.initiator) {
            initiator.current_energy -= transferred;
        }
        if let Some(target) = state.character_mut(target_id) {
            target.current_energy = (target.current_energy + transferred).min(target_max);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::dice::RollOutcome;
    use crate::state::{Campaign, Character, Coordinates, Position};
    use crate::stats::StatKind;

    fn roll(outcome: RollOutcome, multiplier: f64) -> DiceRollResult {
        DiceRollResult {
            dice_side: 10,
            multiplier,
            outcome,
        }
    }

    #[test]
    fn flow_accumulation_scales_with_roll_and_clamps() {
        let mut state = CampaignState::new(Campaign::new("test"));
        let dimension = state.default_dimension;
        let mut character = Character::new("lys", dimension);
        character.stats.set_base(StatKind::FlowConnection, 10);
        character.current_energy = 0;
        let id = state.add_character(character);
        let max = {
            let c = state.character(id).unwrap();
            c.max_energy(state.dimension_of(c))
        };

        let action = crate::action::Action::new(1, id, ActionKind::UseSkill);
        let registry = SpecialRegistry::with_defaults();

        registry
            .invoke(
                &mut state,
                &action,
                SpecialSkillKind::FlowAccumulation,
                roll(RollOutcome::BaseValue, 1.0),
            )
            .unwrap();
        assert_eq!(
            state.character(id).unwrap().current_energy,
            (max as f64 * 0.7).round() as i32
        );

        // A critical success would overshoot; the pool clamps at max.
        registry
            .invoke(
                &mut state,
                &action,
                SpecialSkillKind::FlowAccumulation,
                roll(RollOutcome::CriticalSuccess, 2.0),
            )
            .unwrap();
        assert_eq!(state.character(id).unwrap().current_energy, max);
    }

    #[test]
    fn critical_fail_is_a_no_op() {
        let mut state = CampaignState::new(Campaign::new("test"));
        let dimension = state.default_dimension;
        let mut character = Character::new("lys", dimension);
        character.current_energy = 3;
        let id = state.add_character(character);

        let action = crate::action::Action::new(1, id, ActionKind::UseSkill);
        SpecialRegistry::with_defaults()
            .invoke(
                &mut state,
                &action,
                SpecialSkillKind::FlowAccumulation,
                roll(RollOutcome::CriticalFail, 0.5),
            )
            .unwrap();
        assert_eq!(state.character(id).unwrap().current_energy, 3);
    }

    #[test]
    fn group_teleport_moves_initiator_and_targets() {
        let mut state = CampaignState::new(Campaign::new("test"));
        let destination = state
            .positions
            .insert(Position::new("refuge", Coordinates::new(3, 3, 0)));
        let dimension = state.default_dimension;
        let a = state.add_character(Character::new("a", dimension));
        let b = state.add_character(Character::new("b", dimension));

        let action = crate::action::Action::new(1, a, ActionKind::UseSkill)
            .with_targets(vec![b])
            .with_position(destination);
        SpecialRegistry::with_defaults()
            .invoke(
                &mut state,
                &action,
                SpecialSkillKind::GroupTeleport,
                roll(RollOutcome::BaseValue, 1.0),
            )
            .unwrap();

        assert_eq!(state.character(a).unwrap().position, Some(destination));
        assert_eq!(state.character(b).unwrap().position, Some(destination));
    }

    #[test]
    fn energy_transfer_caps_at_available() {
        let mut state = CampaignState::new(Campaign::new("test"));
        let dimension = state.default_dimension;
        let mut donor = Character::new("donor", dimension);
        donor.current_energy = 6;
        let donor_id = state.add_character(donor);
        let recipient = state.add_character(Character::new("recipient", dimension));

        let action = crate::action::Action::new(1, donor_id, ActionKind::UseSkill)
            .with_targets(vec![recipient]);
        SpecialRegistry::with_defaults()
            .invoke(
                &mut state,
                &action,
                SpecialSkillKind::EnergyTransfer,
                roll(RollOutcome::BaseValue, 1.0),
            )
            .unwrap();

        assert_eq!(state.character(donor_id).unwrap().current_energy, 0);
        assert_eq!(state.character(recipient).unwrap().current_energy, 6);
    }
}

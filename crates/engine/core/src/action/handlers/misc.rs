//! Miscellaneous actions: plain rolls, GM intervention, resting, anomaly
//! interaction, fight declaration.

use crate::action::{Action, ActionError, ActionHandler, ActionKind};
use crate::anomaly::resolve_anomaly;
use crate::dice::DiceService;
use crate::effect::deactivate_effect;
use crate::skill::{CostKind, SkillCost};
use crate::state::{CampaignState, CharacterId, PositionId};

use super::{initiator_luck, require_co_located_targets, single_target};

const ANOMALY_AP_COST: i32 = 2;
const START_FIGHT_AP_COST: i32 = 1;

/// A plain, consequence-free dice roll. Sides come from the payload,
/// defaulting to a d20.
pub struct DiceRollHandler;

impl ActionHandler for DiceRollHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::DiceRoll
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(Vec::new())
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let sides = action
            .data
            .as_ref()
            .and_then(|d| d.get("sides"))
            .and_then(|s| s.as_u64())
            .unwrap_or(20) as u32;

        let luck = initiator_luck(state, action.initiator)?;
        let roll = DiceService::new(luck, sides).roll(rng);
        tracing::info!(
            initiator = %action.initiator,
            sides,
            face = roll.dice_side,
            outcome = roll.outcome.as_str(),
            "dice roll"
        );
        Ok(())
    }
}

/// Game-master intervention: direct state surgery, gated on GM membership.
///
/// Payload: `{"op": "revive" | "teleport", "target": <id>, ...}`.
pub struct GodInterventionHandler;

impl GodInterventionHandler {
    fn op(action: &Action) -> Result<String, ActionError> {
        action
            .data
            .as_ref()
            .and_then(|d| d.get("op"))
            .and_then(|v| v.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ActionError::InvalidPayload("op required".into()))
    }

    fn payload_field<T: serde::de::DeserializeOwned>(
        action: &Action,
        field: &str,
    ) -> Result<T, ActionError> {
        action
            .data
            .as_ref()
            .and_then(|d| d.get(field))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| ActionError::InvalidPayload(format!("{field} required")))
    }
}

impl ActionHandler for GodInterventionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::GodIntervention
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        if !state.campaign.game_masters.contains(&action.initiator) {
            return Err(ActionError::InvalidPayload(
                "initiator is not a game master".into(),
            ));
        }
        match Self::op(action)?.as_str() {
            "revive" | "teleport" => Ok(()),
            other => Err(ActionError::InvalidPayload(format!("unknown op '{other}'"))),
        }
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(Vec::new())
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let target: CharacterId = Self::payload_field(action, "target")?;

        match Self::op(action)?.as_str() {
            "revive" => {
                // Clear incapacitation, stand the target back up.
                let effects: Vec<_> = state
                    .character(target)
                    .ok_or(ActionError::TargetNotFound)?
                    .active_effects()
                    .filter(|e| e.kind.is_incapacitating())
                    .map(|e| e.id)
                    .collect();
                for effect in effects {
                    deactivate_effect(state, target, effect);
                }
                let character = state
                    .character_mut(target)
                    .ok_or(ActionError::TargetNotFound)?;
                character.current_hp = character.current_hp.max(1);
                character.is_active = true;
            }
            "teleport" => {
                let position: PositionId = Self::payload_field(action, "position")?;
                if !state.positions.contains(position) {
                    return Err(ActionError::PositionNotFound);
                }
                state
                    .character_mut(target)
                    .ok_or(ActionError::TargetNotFound)?
                    .position = Some(position);
            }
            _ => unreachable!("check() rejects unknown ops"),
        }

        tracing::info!(gm = %action.initiator, %target, "god intervention");
        Ok(())
    }
}

/// Spends the rest of the cycle recovering and marks the spot safe.
pub struct LongRestHandler;

impl ActionHandler for LongRestHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::LongRest
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let initiator = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        if initiator.fight.is_some() {
            return Err(ActionError::FightAlreadyOpen);
        }
        Ok(())
    }

    fn costs(&self, state: &CampaignState, action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        // Resting consumes every remaining action point.
        let remaining = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .current_ap;
        Ok(vec![SkillCost {
            kind: CostKind::ActionPoints,
            value: remaining.max(0),
        }])
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let initiator = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        let max_hp = initiator.max_hp();
        let max_energy = initiator.max_energy(state.dimension_of(initiator));

        let initiator = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        initiator.current_hp = (initiator.current_hp + max_hp / 4).min(max_hp);
        initiator.current_energy = (initiator.current_energy + max_energy / 2).min(max_energy);
        if initiator.position.is_some() {
            initiator.last_safe_position = initiator.position;
        }
        Ok(())
    }
}

/// Interacts with a known anomaly at the initiator's position.
pub struct AnomalyHandler;

impl ActionHandler for AnomalyHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Anomaly
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let position = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        if !state.anomalies.values().any(|a| a.position == position) {
            return Err(ActionError::AnomalyNotFound);
        }
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(vec![SkillCost {
            kind: CostKind::ActionPoints,
            value: ANOMALY_AP_COST,
        }])
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let position = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        let anomaly = state
            .anomalies
            .values()
            .find(|a| a.position == position)
            .map(|a| a.id)
            .ok_or(ActionError::AnomalyNotFound)?;

        let outcome = resolve_anomaly(state, action.initiator, anomaly, rng)?;
        tracing::info!(initiator = %action.initiator, ?outcome, "anomaly interaction");
        Ok(())
    }
}

/// Declares open hostility against a co-located character. The performed
/// declaration is picked up by fight detection.
pub struct StartFightHandler;

impl ActionHandler for StartFightHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::StartFight
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let target = single_target(action)?;
        require_co_located_targets(state, action)?;

        let position = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        if state.open_fight_at(position).is_some() {
            return Err(ActionError::FightAlreadyOpen);
        }
        if state
            .character(target)
            .map(|c| c.is_incapacitated())
            .unwrap_or(true)
        {
            return Err(ActionError::TargetInactive);
        }
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(vec![SkillCost {
            kind: CostKind::ActionPoints,
            value: START_FIGHT_AP_COST,
        }])
    }

    fn perform(
        &self,
        _state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        tracing::info!(initiator = %action.initiator, target = ?action.targets.first(), "fight declared");
        Ok(())
    }
}

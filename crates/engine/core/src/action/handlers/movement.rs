//! Movement actions: graph traversal, sub-location shifts, safe-zone
//! retreats, and dimension shifts.

use crate::action::{Action, ActionError, ActionHandler, ActionKind};
use crate::skill::{CostKind, SkillCost};
use crate::state::{CampaignState, DimensionId, DEFAULT_SAFE_COORDINATES};

const MOVE_AP_COST: i32 = 1;
const SAFE_ZONE_AP_COST: i32 = 3;
const DIMENSION_SHIFT_AP_COST: i32 = 2;

fn ap(value: i32) -> Vec<SkillCost> {
    vec![SkillCost {
        kind: CostKind::ActionPoints,
        value,
    }]
}

/// Traverses one unlocked edge of the position graph.
pub struct MoveHandler;

impl ActionHandler for MoveHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Move
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let destination = action.position.ok_or(ActionError::PositionRequired)?;
        if !state.positions.contains(destination) {
            return Err(ActionError::PositionNotFound);
        }
        let from = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        if !state.positions.reachable(from, destination) {
            return Err(ActionError::PositionNotReachable);
        }
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(MOVE_AP_COST))
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let destination = action.position.ok_or(ActionError::PositionRequired)?;
        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.position = Some(destination);
        Ok(())
    }
}

/// Shifts the initiator's sub-location within their current position.
pub struct ChangePositionHandler;

impl ChangePositionHandler {
    fn sub_location(action: &Action) -> Result<String, ActionError> {
        action
            .data
            .as_ref()
            .and_then(|d| d.get("sub_location"))
            .and_then(|s| s.as_str())
            .map(str::to_owned)
            .ok_or_else(|| ActionError::InvalidPayload("sub_location required".into()))
    }
}

impl ActionHandler for ChangePositionHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::ChangePosition
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        Self::sub_location(action)?;
        state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(MOVE_AP_COST))
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let sub_location = Self::sub_location(action)?;
        let position = state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;

        // Sub-locations live on the node itself; log the shift for observers.
        let name = state
            .positions
            .get(position)
            .map(|p| p.name.clone())
            .unwrap_or_default();
        tracing::info!(initiator = %action.initiator, position = %name, %sub_location, "sub-location change");
        Ok(())
    }
}

/// Retreats to the initiator's last safe position, or the default safe node.
pub struct BackToSafeZoneHandler;

impl ActionHandler for BackToSafeZoneHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::BackToSafeZone
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SAFE_ZONE_AP_COST))
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let destination = state
            .character(action.initiator)
            .and_then(|c| c.last_safe_position)
            .or_else(|| state.positions.find_by_coordinates(DEFAULT_SAFE_COORDINATES));
        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.position = destination;
        Ok(())
    }
}

/// Shifts the initiator into another dimension, paying its energy toll.
pub struct DimensionShiftHandler;

impl DimensionShiftHandler {
    fn dimension(action: &Action) -> Result<DimensionId, ActionError> {
        action
            .data
            .as_ref()
            .and_then(|d| d.get("dimension"))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| ActionError::InvalidPayload("dimension required".into()))
    }
}

impl ActionHandler for DimensionShiftHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::DimensionShift
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let dimension = Self::dimension(action)?;
        if !state.dimensions.contains_key(&dimension) {
            return Err(ActionError::DimensionNotFound);
        }
        Ok(())
    }

    fn costs(&self, state: &CampaignState, action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        let dimension = Self::dimension(action)?;
        let shift_cost = state
            .dimensions
            .get(&dimension)
            .ok_or(ActionError::DimensionNotFound)?
            .shift_cost;

        let mut costs = ap(DIMENSION_SHIFT_AP_COST);
        if shift_cost > 0 {
            costs.push(SkillCost {
                kind: CostKind::Energy,
                value: shift_cost,
            });
        }
        Ok(costs)
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let dimension = Self::dimension(action)?;
        let character = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        character.dimension = dimension;
        Ok(())
    }
}

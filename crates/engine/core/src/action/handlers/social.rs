//! Social actions: dialogue, duel invitations, gifting, inspection, theft.
//!
//! Duels resolve across two actions: the invitation is itself the pending
//! state, and a performed acceptance is what fight detection pairs into a
//! new fight on the next cycle boundary.

use crate::action::{Action, ActionError, ActionHandler, ActionKind};
use crate::dice::DiceService;
use crate::skill::{CostKind, SkillCost};
use crate::state::{ActionId, CampaignState, ItemId};

use super::{initiator_luck, require_co_located_targets, require_owned_item, single_target};

const SOCIAL_AP_COST: i32 = 1;
const SNATCH_AP_COST: i32 = 2;

fn ap(value: i32) -> Vec<SkillCost> {
    vec![SkillCost {
        kind: CostKind::ActionPoints,
        value,
    }]
}

/// Opens a dialogue with co-located targets. Pure narration; the state
/// machine only validates and logs.
pub struct StartDialogueHandler;

impl ActionHandler for StartDialogueHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::StartDialogue
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        if action.targets.is_empty() {
            return Err(ActionError::TargetNotFound);
        }
        require_co_located_targets(state, action)
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SOCIAL_AP_COST))
    }

    fn perform(
        &self,
        _state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        tracing::info!(initiator = %action.initiator, targets = action.targets.len(), "dialogue started");
        Ok(())
    }
}

/// Invites a co-located character to a duel. The performed invitation stays
/// in the action log until accepted or rejected.
pub struct MakeDuelInvitationHandler;

impl ActionHandler for MakeDuelInvitationHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::MakeDuelInvitation
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let target = single_target(action)?;
        require_co_located_targets(state, action)?;
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
        Ok(ap(SOCIAL_AP_COST))
    }

    fn perform(
        &self,
        _state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        tracing::info!(initiator = %action.initiator, target = ?action.targets.first(), "duel invitation made");
        Ok(())
    }
}

fn invitation_id(action: &Action) -> Result<ActionId, ActionError> {
    action
        .data
        .as_ref()
        .and_then(|d| d.get("invitation"))
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .ok_or_else(|| ActionError::InvalidPayload("invitation required".into()))
}

/// Validates an invitation addressed to the initiator: it must be a
/// performed duel invitation naming them as the target.
fn check_invitation(state: &CampaignState, action: &Action) -> Result<(), ActionError> {
    let invitation = state
        .action(invitation_id(action)?)
        .ok_or(ActionError::ActionNotFound)?;
    if invitation.kind != ActionKind::MakeDuelInvitation || !invitation.performed {
        return Err(ActionError::ActionNotFound);
    }
    if !invitation.targets.contains(&action.initiator) {
        return Err(ActionError::InvalidPayload(
            "invitation is addressed to someone else".into(),
        ));
    }
    if action.targets != [invitation.initiator] {
        return Err(ActionError::InvalidPayload(
            "acceptance must target the inviter".into(),
        ));
    }
    Ok(())
}

/// Accepts a duel invitation. The performed acceptance is an aggressive
/// pairing; the next fight-detection pass opens the fight.
pub struct AcceptDuelInvitationHandler;

impl ActionHandler for AcceptDuelInvitationHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::AcceptDuelInvitation
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        check_invitation(state, action)?;
        require_co_located_targets(state, action)
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SOCIAL_AP_COST))
    }

    fn perform(
        &self,
        _state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        tracing::info!(initiator = %action.initiator, "duel invitation accepted");
        Ok(())
    }
}

/// Declines a duel invitation.
pub struct RejectDuelInvitationHandler;

impl ActionHandler for RejectDuelInvitationHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::RejectDuelInvitation
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        check_invitation(state, action)
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(Vec::new())
    }

    fn perform(
        &self,
        _state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        tracing::info!(initiator = %action.initiator, "duel invitation rejected");
        Ok(())
    }
}

/// Hands an owned item to a co-located target.
pub struct GiftHandler;

impl ActionHandler for GiftHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Gift
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        single_target(action)?;
        require_owned_item(state, action)?;
        require_co_located_targets(state, action)
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SOCIAL_AP_COST))
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        _rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let target = single_target(action)?;
        let item = action.item.ok_or(ActionError::ItemRequired)?;

        let initiator = state
            .character_mut(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?;
        initiator.items.retain(|&i| i != item);

        let target = state
            .character_mut(target)
            .ok_or(ActionError::TargetNotFound)?;
        target.items.push(item);
        Ok(())
    }
}

/// Studies the surroundings. A lucky roll uncovers hidden anomalies at the
/// initiator's position.
pub struct InspectHandler;

impl ActionHandler for InspectHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Inspect
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        state
            .character(action.initiator)
            .ok_or(ActionError::InitiatorNotFound)?
            .position
            .ok_or(ActionError::PositionRequired)?;
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SOCIAL_AP_COST))
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

        let luck = initiator_luck(state, action.initiator)?;
        let roll = DiceService::new(luck, 20).roll(rng);
        if roll.multiplier < 1.0 {
            tracing::debug!(initiator = %action.initiator, "inspection found nothing");
            return Ok(());
        }

        for anomaly in state.anomalies.values_mut() {
            if anomaly.position == position && !anomaly.known {
                anomaly.known = true;
                tracing::info!(anomaly = %anomaly.name, "anomaly uncovered");
            }
        }
        Ok(())
    }
}

/// Attempts to steal a named item from a co-located target. Contested on a
/// d20; only Good Luck or better succeeds.
pub struct SnatchHandler;

impl SnatchHandler {
    fn wanted_item(action: &Action) -> Result<ItemId, ActionError> {
        action
            .data
            .as_ref()
            .and_then(|d| d.get("item"))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .ok_or_else(|| ActionError::InvalidPayload("item required".into()))
    }
}

impl ActionHandler for SnatchHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::Snatch
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let target = single_target(action)?;
        let item = Self::wanted_item(action)?;
        require_co_located_targets(state, action)?;

        let target = state.character(target).ok_or(ActionError::TargetNotFound)?;
        if !target.owns_item(item) {
            return Err(ActionError::ItemNotOwned);
        }
        Ok(())
    }

    fn costs(&self, _state: &CampaignState, _action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(ap(SNATCH_AP_COST))
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let target_id = single_target(action)?;
        let item = Self::wanted_item(action)?;

        let luck = initiator_luck(state, action.initiator)?;
        let roll = DiceService::new(luck, 20).roll(rng);
        if roll.multiplier <= 1.0 {
            tracing::debug!(initiator = %action.initiator, "snatch attempt failed");
            return Ok(());
        }

        if let Some(target) = state.character_mut(target_id) {
            target.items.retain(|&i| i != item);
        }
        if let Some(initiator) = state.character_mut(action.initiator) {
            initiator.items.push(item);
        }
        Ok(())
    }
}

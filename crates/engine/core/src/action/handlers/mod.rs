//! Built-in action handlers, one per [`ActionKind`](super::ActionKind).

mod misc;
mod movement;
mod social;
mod use_item;
mod use_skill;

pub use misc::{
    AnomalyHandler, DiceRollHandler, GodInterventionHandler, LongRestHandler, StartFightHandler,
};
pub use movement::{
    BackToSafeZoneHandler, ChangePositionHandler, DimensionShiftHandler, MoveHandler,
};
pub use social::{
    AcceptDuelInvitationHandler, GiftHandler, InspectHandler, MakeDuelInvitationHandler,
    RejectDuelInvitationHandler, SnatchHandler, StartDialogueHandler,
};
pub use use_item::UseItemHandler;
pub use use_skill::UseSkillHandler;

use super::{Action, ActionError};
use crate::skill::Skill;
use crate::state::{CampaignState, CharacterId, Item};
use crate::stats::StatKind;

// ============================================================================
// Shared validation helpers
// ============================================================================

/// Resolves the action's skill and checks the initiator may use it: learned,
/// school known, rank grade sufficient (lower grade outranks higher).
pub(crate) fn require_usable_skill<'a>(
    state: &'a CampaignState,
    action: &Action,
) -> Result<&'a Skill, ActionError> {
    let skill_id = action.skill.ok_or(ActionError::SkillRequired)?;
    let skill = state.skills.get(&skill_id).ok_or(ActionError::SkillNotFound)?;
    let initiator = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;

    if !initiator.knows_skill(skill_id) {
        return Err(ActionError::SkillNotLearned);
    }
    if let Some(school) = &skill.school {
        if !initiator.knows_school(school) {
            return Err(ActionError::SchoolNotLearned(school.clone()));
        }
    }
    if initiator.rank.grade > skill.grade {
        return Err(ActionError::RankTooLow {
            required: skill.grade,
            actual: initiator.rank.grade,
        });
    }
    Ok(skill)
}

/// Resolves the action's item and checks the initiator owns it.
pub(crate) fn require_owned_item<'a>(
    state: &'a CampaignState,
    action: &Action,
) -> Result<&'a Item, ActionError> {
    let item_id = action.item.ok_or(ActionError::ItemRequired)?;
    let item = state.items.get(&item_id).ok_or(ActionError::ItemNotFound)?;
    let initiator = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;
    if !initiator.owns_item(item_id) {
        return Err(ActionError::ItemNotOwned);
    }
    Ok(item)
}

/// Checks every target exists, is active, and stands at the initiator's
/// position.
pub(crate) fn require_co_located_targets(
    state: &CampaignState,
    action: &Action,
) -> Result<(), ActionError> {
    let position = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?
        .position;

    for &target_id in &action.targets {
        let target = state
            .character(target_id)
            .ok_or(ActionError::TargetNotFound)?;
        if !target.is_active {
            return Err(ActionError::TargetInactive);
        }
        if target.position != position || position.is_none() {
            return Err(ActionError::TargetNotCoLocated);
        }
    }
    Ok(())
}

/// Requires exactly one target and returns it.
pub(crate) fn single_target(action: &Action) -> Result<CharacterId, ActionError> {
    match action.targets.as_slice() {
        [target] => Ok(*target),
        _ => Err(ActionError::InvalidPayload(
            "exactly one target required".into(),
        )),
    }
}

/// The initiator's effective luck, for seeding a die.
pub(crate) fn initiator_luck(state: &CampaignState, id: CharacterId) -> Result<i32, ActionError> {
    Ok(state
        .character(id)
        .ok_or(ActionError::InitiatorNotFound)?
        .stats
        .effective(StatKind::Luck))
}

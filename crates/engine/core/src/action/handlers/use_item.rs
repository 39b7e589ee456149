//! Use-Item: resolves an item's impacts and effects, consuming food.

use super::{initiator_luck, require_co_located_targets, require_owned_item};
use crate::action::{Action, ActionError, ActionHandler, ActionKind};
use crate::dice::DiceService;
use crate::effect::assign_effect;
use crate::impact::resolve_impacts;
use crate::skill::SkillCost;
use crate::state::{CampaignState, ItemKind};

const ITEM_DICE_SIDES: u32 = 20;

pub struct UseItemHandler;

impl ActionHandler for UseItemHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::UseItem
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let item = require_owned_item(state, action)?;
        if item.is_aggressive() && action.targets.is_empty() {
            return Err(ActionError::TargetNotFound);
        }
        require_co_located_targets(state, action)
    }

    fn costs(&self, state: &CampaignState, action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(require_owned_item(state, action)?.costs.clone())
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let item = require_owned_item(state, action)?.clone();
        let luck = initiator_luck(state, action.initiator)?;
        let roll = DiceService::new(luck, ITEM_DICE_SIDES).roll(rng);

        let targets = if action.targets.is_empty() {
            vec![action.initiator]
        } else {
            action.targets.clone()
        };

        resolve_impacts(state, action.id, action.initiator, &item.impacts, &targets, roll)?;
        for assignment in &item.effects {
            for &target in &targets {
                assign_effect(state, Some(action.initiator), target, assignment, rng)?;
            }
        }

        // Food is single-use.
        if item.kind == ItemKind::Food {
            if let Some(initiator) = state.character_mut(action.initiator) {
                initiator.items.retain(|&i| i != item.id);
            }
        }
        Ok(())
    }
}

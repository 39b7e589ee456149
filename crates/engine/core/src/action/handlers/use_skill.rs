//! Use-Skill: the workhorse action.

use super::{initiator_luck, require_co_located_targets, require_usable_skill};
use crate::action::special::SpecialRegistry;
use crate::action::{Action, ActionError, ActionHandler, ActionKind};
use crate::dice::DiceService;
use crate::effect::assign_effect;
use crate::impact::resolve_impacts;
use crate::skill::{SkillCost, SkillType};
use crate::state::{CampaignState, CharacterId};

/// Default die a skill roll uses.
const SKILL_DICE_SIDES: u32 = 20;

/// Dispatches on the skill's type: Special skills go through the
/// sub-registry, everything else rolls once and resolves impacts then
/// effect assignments against each target.
pub struct UseSkillHandler {
    specials: SpecialRegistry,
}

impl Default for UseSkillHandler {
    fn default() -> Self {
        Self {
            specials: SpecialRegistry::with_defaults(),
        }
    }
}

impl UseSkillHandler {
    pub fn new(specials: SpecialRegistry) -> Self {
        Self { specials }
    }

    /// Self-targeting skills default to the initiator when no target is given.
    fn effective_targets(action: &Action) -> Vec<CharacterId> {
        if action.targets.is_empty() {
            vec![action.initiator]
        } else {
            action.targets.clone()
        }
    }
}

impl ActionHandler for UseSkillHandler {
    fn kind(&self) -> ActionKind {
        ActionKind::UseSkill
    }

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError> {
        let skill = require_usable_skill(state, action)?;
        if skill.is_aggressive() && action.targets.is_empty() {
            return Err(ActionError::TargetNotFound);
        }
        require_co_located_targets(state, action)
    }

    fn costs(&self, state: &CampaignState, action: &Action) -> Result<Vec<SkillCost>, ActionError> {
        Ok(require_usable_skill(state, action)?.costs.clone())
    }

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError> {
        let skill = require_usable_skill(state, action)?.clone();
        let luck = initiator_luck(state, action.initiator)?;
        let roll = DiceService::new(luck, SKILL_DICE_SIDES).roll(rng);

        tracing::debug!(
            action = %action.id,
            skill = %skill.name,
            outcome = roll.outcome.as_str(),
            "skill roll"
        );

        if skill.skill_type == SkillType::Special {
            let kind = skill.special.ok_or_else(|| {
                ActionError::InvalidPayload("special skill without a special kind".into())
            })?;
            return self.specials.invoke(state, action, kind, roll);
        }

        let targets = Self::effective_targets(action);
        resolve_impacts(state, action.id, action.initiator, &skill.impacts, &targets, roll)?;

        for assignment in &skill.effects {
            for &target in &targets {
                assign_effect(state, Some(action.initiator), target, assignment, rng)?;
            }
        }
        Ok(())
    }
}

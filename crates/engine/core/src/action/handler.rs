//! Action handler trait, registry, and the acceptance path.

use std::collections::HashMap;

use super::{Action, ActionError, ActionKind};
use crate::skill::{CostKind, SkillCost};
use crate::state::{ActionId, CampaignState};
use crate::stats::StatKind;

/// Behavior of one action kind.
///
/// `check` validates the action against current state and is called both at
/// submission and again right before dispatch; `check_acceptance` adds
/// acceptance-only validation; `costs` prices the action; `perform` executes
/// it against mutable state.
pub trait ActionHandler: Send + Sync {
    fn kind(&self) -> ActionKind;

    fn check(&self, state: &CampaignState, action: &Action) -> Result<(), ActionError>;

    /// Extra validation run only when the action is being accepted.
    fn check_acceptance(&self, _state: &CampaignState, _action: &Action) -> Result<(), ActionError> {
        Ok(())
    }

    fn costs(&self, state: &CampaignState, action: &Action) -> Result<Vec<SkillCost>, ActionError>;

    fn perform(
        &self,
        state: &mut CampaignState,
        action: &Action,
        rng: &mut dyn rand::RngCore,
    ) -> Result<(), ActionError>;
}

/// Keyed registry of action handlers, one per [`ActionKind`].
pub struct ActionRegistry {
    handlers: HashMap<ActionKind, Box<dyn ActionHandler>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry covering every built-in action kind.
    pub fn with_defaults() -> Self {
        use super::handlers::*;

        let mut registry = Self::new();
        registry.register(Box::new(UseSkillHandler::default()));
        registry.register(Box::new(UseItemHandler));
        registry.register(Box::new(MoveHandler));
        registry.register(Box::new(ChangePositionHandler));
        registry.register(Box::new(BackToSafeZoneHandler));
        registry.register(Box::new(DimensionShiftHandler));
        registry.register(Box::new(StartDialogueHandler));
        registry.register(Box::new(MakeDuelInvitationHandler));
        registry.register(Box::new(AcceptDuelInvitationHandler));
        registry.register(Box::new(RejectDuelInvitationHandler));
        registry.register(Box::new(StartFightHandler));
        registry.register(Box::new(DiceRollHandler));
        registry.register(Box::new(GiftHandler));
        registry.register(Box::new(AnomalyHandler));
        registry.register(Box::new(GodInterventionHandler));
        registry.register(Box::new(LongRestHandler));
        registry.register(Box::new(InspectHandler));
        registry.register(Box::new(SnatchHandler));
        registry
    }

    pub fn register(&mut self, handler: Box<dyn ActionHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn handler(&self, kind: ActionKind) -> Result<&dyn ActionHandler, ActionError> {
        self.handlers
            .get(&kind)
            .map(|h| h.as_ref())
            .ok_or(ActionError::HandlerNotFound)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Accepts a queued action: validates it, debits its costs, assigns its
/// dispatch order, and pins the initiator's fight.
///
/// Costs are debited against a snapshot; either all costs apply or none do.
/// The order key is computed from the initiator's post-debit action points:
/// `(max_ap − current_ap) / max_ap + 1 / speed`, so cheaper-acting and
/// faster characters dispatch earlier. Non-positive speed orders last.
pub fn accept_action(
    state: &mut CampaignState,
    registry: &ActionRegistry,
    id: ActionId,
) -> Result<(), ActionError> {
    let action = state.action(id).ok_or(ActionError::ActionNotFound)?.clone();
    if action.accepted {
        return Err(ActionError::AlreadyAccepted);
    }
    if action.performed {
        return Err(ActionError::AlreadyPerformed);
    }

    let initiator = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;
    if !initiator.is_active {
        return Err(ActionError::InitiatorInactive);
    }
    if initiator.is_incapacitated() {
        return Err(ActionError::InitiatorIncapacitated);
    }

    let handler = registry.handler(action.kind)?;
    handler.check(state, &action)?;
    handler.check_acceptance(state, &action)?;
    let costs = handler.costs(state, &action)?;

    let initiator = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;

    // All-or-nothing debit against a snapshot of current resources.
    let mut hp = initiator.current_hp;
    let mut energy = initiator.current_energy;
    let mut ap = initiator.current_ap;
    for cost in &costs {
        let (pool, resource) = match cost.kind {
            CostKind::ActionPoints => (&mut ap, "action points"),
            CostKind::Energy => (&mut energy, "energy"),
            CostKind::Health => (&mut hp, "health"),
        };
        if *pool < cost.value {
            return Err(ActionError::InsufficientResources {
                resource,
                required: cost.value,
                available: *pool,
            });
        }
        *pool -= cost.value;
    }

    let max_ap = initiator.max_ap(state.dimension_of(initiator)).max(1);
    let speed = initiator.stats.effective(StatKind::Speed);
    let order = if speed <= 0 {
        f64::INFINITY
    } else {
        (max_ap - ap) as f64 / max_ap as f64 + 1.0 / speed as f64
    };

    let fight = initiator.fight;
    let position = initiator.position;

    let initiator = state
        .character_mut(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;
    initiator.current_hp = hp;
    initiator.current_energy = energy;
    initiator.current_ap = ap;

    let action = state.action_mut(id).ok_or(ActionError::ActionNotFound)?;
    action.order = Some(order);
    action.accepted = true;
    action.fight = fight;
    if action.position.is_none() {
        action.position = position;
    }

    tracing::debug!(action = %id, order, "action accepted");
    Ok(())
}

/// Performs an accepted action through its handler and marks it performed.
///
/// The handler's `check` runs again right before execution; state may have
/// shifted since acceptance.
pub fn perform_action(
    state: &mut CampaignState,
    registry: &ActionRegistry,
    id: ActionId,
    rng: &mut dyn rand::RngCore,
) -> Result<(), ActionError> {
    let action = state.action(id).ok_or(ActionError::ActionNotFound)?.clone();
    if !action.accepted {
        return Err(ActionError::NotAccepted);
    }
    if action.performed {
        return Err(ActionError::AlreadyPerformed);
    }

    let initiator = state
        .character(action.initiator)
        .ok_or(ActionError::InitiatorNotFound)?;
    if !initiator.is_active {
        return Err(ActionError::InitiatorInactive);
    }
    if initiator.is_incapacitated() {
        return Err(ActionError::InitiatorIncapacitated);
    }

    let handler = registry.handler(action.kind)?;
    handler.check(state, &action)?;
    handler.perform(state, &action, rng)?;

    if let Some(action) = state.action_mut(id) {
        action.performed = true;
    }
    tracing::debug!(action = %id, kind = action.kind.as_snake_case(), "action performed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::{CostKind, Skill, SkillType};
    use crate::state::{Campaign, Character, SkillId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rest_skill() -> Skill {
        Skill {
            id: SkillId::new(),
            name: "breathing".into(),
            grade: 10,
            skill_type: SkillType::Utility,
            school: None,
            costs: vec![
                SkillCost {
                    kind: CostKind::ActionPoints,
                    value: 2,
                },
                SkillCost {
                    kind: CostKind::Energy,
                    value: 5,
                },
            ],
            impacts: vec![],
            effects: vec![],
            special: None,
        }
    }

    fn setup() -> (CampaignState, ActionRegistry, crate::state::CharacterId, SkillId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let dimension = state.default_dimension;
        let skill = rest_skill();
        let skill_id = skill.id;
        state.skills.insert(skill_id, skill);

        let mut character = Character::new("vren", dimension);
        character.stats.set_base(StatKind::Speed, 8);
        character.current_ap = 7;
        character.current_energy = 20;
        character.skills.push(skill_id);
        let initiator = state.add_character(character);

        (state, ActionRegistry::with_defaults(), initiator, skill_id)
    }

    #[test]
    fn acceptance_debits_costs_and_orders_by_remaining_ap() {
        let (mut state, registry, initiator, skill) = setup();
        let action = Action::new(1, initiator, ActionKind::UseSkill).with_skill(skill);
        let id = state.submit_action(action);

        accept_action(&mut state, &registry, id).unwrap();

        let character = state.character(initiator).unwrap();
        assert_eq!(character.current_ap, 5);
        assert_eq!(character.current_energy, 15);

        // max_ap = 5 + 8/4 = 7; order = (7-5)/7 + 1/8.
        let order = state.action(id).unwrap().order.unwrap();
        assert!((order - (2.0 / 7.0 + 0.125)).abs() < 1e-9);
    }

    #[test]
    fn unaffordable_action_leaves_resources_untouched() {
        let (mut state, registry, initiator, skill) = setup();
        state.character_mut(initiator).unwrap().current_energy = 3;

        let action = Action::new(1, initiator, ActionKind::UseSkill).with_skill(skill);
        let id = state.submit_action(action);

        let err = accept_action(&mut state, &registry, id).unwrap_err();
        assert!(matches!(err, ActionError::InsufficientResources { .. }));

        let character = state.character(initiator).unwrap();
        assert_eq!(character.current_ap, 7);
        assert_eq!(character.current_energy, 3);
        assert!(!state.action(id).unwrap().accepted);
    }

    #[test]
    fn zero_speed_orders_last() {
        let (mut state, registry, initiator, skill) = setup();
        state
            .character_mut(initiator)
            .unwrap()
            .stats
            .set_base(StatKind::Speed, 0);

        let action = Action::new(1, initiator, ActionKind::UseSkill).with_skill(skill);
        let id = state.submit_action(action);
        accept_action(&mut state, &registry, id).unwrap();

        assert_eq!(state.action(id).unwrap().order, Some(f64::INFINITY));
    }

    #[test]
    fn perform_requires_acceptance() {
        let (mut state, registry, initiator, skill) = setup();
        let action = Action::new(1, initiator, ActionKind::UseSkill).with_skill(skill);
        let id = state.submit_action(action);

        let mut rng = StdRng::seed_from_u64(7);
        let err = perform_action(&mut state, &registry, id, &mut rng).unwrap_err();
        assert_eq!(err, ActionError::NotAccepted);
    }
}

//! The cycle pipeline.
//!
//! One call to [`CycleRunner::play`] runs a full cycle against the campaign
//! state: prepare, NPC planning, acceptance, effect ticking, dispatch, post.
//! Effects tick before dispatch, so an effect assigned by this cycle's
//! actions lives through the cycle and starts ticking at the next one.
//! Action failures are isolated; a failed action is reported to its
//! initiator and the cycle keeps going. Only cycle allocation itself is
//! fatal.

use crate::action::{accept_action, perform_action, Action, ActionRegistry};
use crate::effect::{deactivate_effect, force_assign, EffectKind, EffectTickRegistry};
use crate::error::{EngineError, ErrorSeverity};
use crate::events::{DomainEvent, Notifier};
use crate::fight::{close_stale_fights, note_fight_activity, run_fight_phase};
use crate::skill::SkillPowerEngine;
use crate::state::{CampaignState, CharacterId};

/// Fatal pipeline errors. Everything action-scoped is handled in place.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The next cycle record could not be allocated; the campaign clock is
    /// corrupt and the pipeline must stop.
    #[error("cycle allocation failed: {0}")]
    Allocation(String),
}

impl EngineError for CycleError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Allocation(_) => "CYCLE_ALLOCATION_FAILED",
        }
    }
}

/// Source of NPC actions for a cycle. Implementations plan one NPC at a
/// time against a read-only view of the state.
pub trait NpcScheduler: Send + Sync {
    fn plan(
        &self,
        state: &CampaignState,
        npc: CharacterId,
        rng: &mut dyn rand::RngCore,
    ) -> Vec<Action>;
}

/// Scheduler that plans nothing; NPCs stand idle.
pub struct IdleScheduler;

impl NpcScheduler for IdleScheduler {
    fn plan(
        &self,
        _state: &CampaignState,
        _npc: CharacterId,
        _rng: &mut dyn rand::RngCore,
    ) -> Vec<Action> {
        Vec::new()
    }
}

/// Tally of one played cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub performed: usize,
    pub failed: usize,
    pub npc_actions: usize,
}

/// Owns the registries a cycle needs and drives the five pipeline steps.
pub struct CycleRunner {
    registry: ActionRegistry,
    ticks: EffectTickRegistry,
    power: SkillPowerEngine,
}

impl CycleRunner {
    pub fn new() -> Self {
        Self {
            registry: ActionRegistry::with_defaults(),
            ticks: EffectTickRegistry::with_defaults(),
            power: SkillPowerEngine::new(),
        }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    pub fn power(&self) -> &SkillPowerEngine {
        &self.power
    }

    /// Plays one full cycle.
    pub fn play(
        &self,
        state: &mut CampaignState,
        scheduler: &dyn NpcScheduler,
        notifier: &dyn Notifier,
        rng: &mut dyn rand::RngCore,
    ) -> Result<CycleReport, CycleError> {
        let cycle = state.current_cycle();
        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };
        tracing::info!(cycle, campaign = %state.campaign.name, "cycle start");

        self.prepare(state, notifier);
        report.npc_actions = self.plan_npcs(state, scheduler, rng);
        self.accept_queued(state, notifier);
        self.apply_effects(state);
        self.dispatch(state, notifier, rng, &mut report);
        self.post(state, notifier);
        self.allocate_next_cycle(state)?;

        tracing::info!(
            cycle,
            performed = report.performed,
            failed = report.failed,
            "cycle complete"
        );
        Ok(report)
    }

    // ========================================================================
    // Step 1: prepare
    // ========================================================================

    /// Settles stat resets, runs the auto-map mirror, and runs the fight
    /// phase against last cycle's actions.
    fn prepare(&self, state: &mut CampaignState, notifier: &dyn Notifier) {
        let cycle = state.current_cycle();

        let mut any_reset = false;
        for character in state.characters.values_mut() {
            if character.is_active && character.resetting_base_stats {
                character.stats.reset_to_base();
                character.resetting_base_stats = false;
                any_reset = true;
            }
        }
        if any_reset {
            self.power.invalidate_all();
        }
        mirror_cartographs(state);

        run_fight_phase(state, cycle.saturating_sub(1), notifier);
    }

    // ========================================================================
    // Step 2: NPC planning
    // ========================================================================

    fn plan_npcs(
        &self,
        state: &mut CampaignState,
        scheduler: &dyn NpcScheduler,
        rng: &mut dyn rand::RngCore,
    ) -> usize {
        let npcs: Vec<CharacterId> = state
            .suitable_characters()
            .into_iter()
            .filter(|id| {
                state
                    .character(*id)
                    .map(|c| c.npc && !c.is_incapacitated())
                    .unwrap_or(false)
            })
            .collect();

        let mut planned = 0;
        for npc in npcs {
            for action in scheduler.plan(state, npc, rng) {
                let id = state.submit_action(action);
                match accept_action(state, &self.registry, id) {
                    Ok(()) => planned += 1,
                    Err(error) => {
                        // NPC plans fail quietly; the planner sees fresh
                        // state next cycle.
                        tracing::debug!(%npc, code = error.error_code(), "npc action rejected");
                        state.cancel_action(id);
                    }
                }
            }
        }
        planned
    }

    // ========================================================================
    // Step 3: acceptance
    // ========================================================================

    /// Accepts queued actions for this cycle. Rejections are reported to
    /// their initiators and the action is dropped.
    fn accept_queued(&self, state: &mut CampaignState, notifier: &dyn Notifier) {
        let cycle = state.current_cycle();
        let pending: Vec<_> = state
            .actions
            .values()
            .filter(|a| a.cycle == cycle && !a.accepted && !a.performed)
            .map(|a| (a.id, a.initiator))
            .collect();

        for (id, initiator) in pending {
            if let Err(error) = accept_action(state, &self.registry, id) {
                notifier.publish(DomainEvent::ActionFailed {
                    action: id,
                    initiator,
                    cycle,
                    code: error.error_code(),
                    message: error.to_string(),
                });
                state.cancel_action(id);
            }
        }
    }

    // ========================================================================
    // Step 4: apply effects
    // ========================================================================

    /// Ticks every active effect before dispatch: the duration advances, the
    /// kind's handler applies its per-cycle impact, and a finished effect
    /// runs its transition and deactivates. Effects assigned later in the
    /// cycle are untouched until the next one.
    fn apply_effects(&self, state: &mut CampaignState) {
        for id in state.suitable_characters() {
            let Some(character) = state.character(id) else {
                continue;
            };
            let active: Vec<_> = character
                .active_effects()
                .map(|e| (e.id, e.kind))
                .collect();

            for (effect_id, kind) in active {
                if let Some(character) = state.character_mut(id) {
                    if let Some(effect) = character.effects.iter_mut().find(|e| e.id == effect_id) {
                        effect.duration += 1;
                    }
                }

                let handler = self.ticks.handler(kind);
                handler.tick(state, id, effect_id);

                let finished = state
                    .character(id)
                    .and_then(|c| c.effects.iter().find(|e| e.id == effect_id))
                    .map(|e| e.is_finished())
                    .unwrap_or(false);
                if finished {
                    handler.on_finish(state, id, effect_id);
                    deactivate_effect(state, id, effect_id);
                }
            }
        }
    }

    // ========================================================================
    // Step 5: dispatch
    // ========================================================================

    /// Performs accepted actions in order. A failing action is reported and
    /// skipped; the rest of the cycle is unaffected.
    fn dispatch(
        &self,
        state: &mut CampaignState,
        notifier: &dyn Notifier,
        rng: &mut dyn rand::RngCore,
        report: &mut CycleReport,
    ) {
        let cycle = state.current_cycle();
        for id in state.dispatchable_actions(cycle) {
            let (initiator, fight) = match state.action(id) {
                Some(a) => (a.initiator, a.fight),
                None => continue,
            };

            match perform_action(state, &self.registry, id, rng) {
                Ok(()) => {
                    report.performed += 1;
                    if let Some(fight) = fight {
                        note_fight_activity(state, fight, cycle);
                    }
                }
                Err(error) => {
                    report.failed += 1;
                    if error.severity().reports_to_initiator() {
                        notifier.publish(DomainEvent::ActionFailed {
                            action: id,
                            initiator,
                            cycle,
                            code: error.error_code(),
                            message: error.to_string(),
                        });
                    }
                    tracing::warn!(action = %id, code = error.error_code(), "action failed in dispatch");
                }
            }
        }
    }

    // ========================================================================
    // Step 6: post
    // ========================================================================

    /// Settles knock-outs and recovery, refills action points, decays
    /// shields, and closes fights that the cycle's outcomes invalidated.
    fn post(&self, state: &mut CampaignState, notifier: &dyn Notifier) {
        self.settle_conditions(state);
        self.decay_shields(state);
        close_stale_fights(state, notifier);
    }

    /// Per-character end-of-cycle bookkeeping. A character at zero HP
    /// without an incapacitation effect gets Knocked-Out; one carrying
    /// Knocked-Out with HP back above zero sheds it and stands up instead
    /// of sliding into Coma. Everyone else refills action points for the
    /// next cycle; a character still down gets none. Resources are clamped
    /// to their maxima afterwards.
    fn settle_conditions(&self, state: &mut CampaignState) {
        let ends_in = state.config.knockout_ends_in;
        for id in state.suitable_characters() {
            let Some(character) = state.character(id) else {
                continue;
            };
            let dimension = state.dimension_of(character).clone();
            let fallen = character.is_knocked_out();
            let knocked = character.has_effect(EffectKind::KnockedOut);
            let comatose = character.has_effect(EffectKind::Coma);
            let max_ap = character.max_ap(&dimension);
            let knockouts: Vec<_> = character
                .active_effects()
                .filter(|e| e.kind == EffectKind::KnockedOut)
                .map(|e| e.id)
                .collect();

            if fallen && !knocked && !comatose {
                force_assign(state, id, EffectKind::KnockedOut, ends_in);
                tracing::info!(character = %id, "knocked out");
            } else if knocked && !fallen {
                for effect in knockouts {
                    deactivate_effect(state, id, effect);
                }
                tracing::info!(character = %id, "recovered from knock-out");
            } else if !knocked {
                if let Some(c) = state.character_mut(id) {
                    c.current_ap = max_ap;
                }
            }

            if let Some(c) = state.character_mut(id) {
                c.clamp_resources(&dimension);
            }
        }
    }

    fn decay_shields(&self, state: &mut CampaignState) {
        for character in state.characters.values_mut() {
            for shield in character.shields.values_mut() {
                shield.decay();
            }
            character
                .shields
                .retain(|_, s| s.cycles_left > 0 && !s.is_broken());
        }
    }

    // ========================================================================
    // Cycle allocation
    // ========================================================================

    /// Supersedes the current cycle. Numbers must stay unique and strictly
    /// increasing; a violation means the clock is corrupt.
    fn allocate_next_cycle(&self, state: &mut CampaignState) -> Result<(), CycleError> {
        let before = state.current_cycle();
        let next = state.advance_cycle();
        if next != before + 1 {
            return Err(CycleError::Allocation(format!(
                "expected cycle {}, allocated {next}",
                before + 1
            )));
        }
        Ok(())
    }
}

impl Default for CycleRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Cartograph carriers mirror their position into their organization's
/// discovered map. Runs every prepare phase; callable out of cycle after a
/// GM edit.
pub fn mirror_cartographs(state: &mut CampaignState) {
    let discoveries: Vec<(crate::state::OrganizationId, crate::state::PositionId)> = state
        .characters
        .values()
        .filter(|c| c.is_active)
        .filter_map(|c| {
            let organization = c.organization?;
            let position = c.position?;
            let carries = c
                .items
                .iter()
                .filter_map(|i| state.items.get(i))
                .any(|i| i.cartograph);
            carries.then_some((organization, position))
        })
        .collect();

    for (organization, position) in discoveries {
        if let Some(org) = state.organizations.get_mut(&organization) {
            if org.discovered_positions.insert(position) {
                tracing::debug!(organization = %org.name, "position mirrored to map");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::effect::EffectTemplate;
    use crate::events::CollectingNotifier;
    use crate::shield::ActiveShield;
    use crate::skill::{
        CostKind, ImpactFormula, ImpactKind, Skill, SkillCost, SkillImpact, SkillType, Violation,
    };
    use crate::state::{Campaign, Character, Coordinates, Position, SkillId};
    use crate::stats::StatKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strike(cost: i32) -> Skill {
        Skill {
            id: SkillId::new(),
            name: "strike".into(),
            grade: 10,
            skill_type: SkillType::Attack,
            school: None,
            costs: vec![SkillCost {
                kind: CostKind::ActionPoints,
                value: cost,
            }],
            impacts: vec![SkillImpact {
                kind: ImpactKind::Damage,
                violation: Violation::Physical,
                formula: ImpactFormula::flat(6.0),
            }],
            effects: vec![],
            special: None,
        }
    }

    fn world() -> (CampaignState, CharacterId, CharacterId, SkillId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let arena = state
            .positions
            .insert(Position::new("arena", Coordinates::new(0, 0, 0)));
        let dimension = state.default_dimension;
        let skill = strike(2);
        let skill_id = skill.id;
        state.skills.insert(skill_id, skill);

        let mut a = Character::new("a", dimension);
        a.position = Some(arena);
        a.current_hp = 100;
        a.current_ap = 7;
        a.skills.push(skill_id);
        a.stats.set_base(StatKind::Speed, 8);
        a.stats.set_base(StatKind::Luck, 10);
        let a_id = state.add_character(a);

        let mut b = Character::new("b", dimension);
        b.position = Some(arena);
        b.current_hp = 100;
        b.current_ap = 6;
        b.stats.set_base(StatKind::Speed, 4);
        let b_id = state.add_character(b);

        (state, a_id, b_id, skill_id)
    }

    #[test]
    fn full_cycle_accepts_dispatches_and_advances() {
        let (mut state, a, b, skill) = world();
        let cycle = state.current_cycle();
        state.submit_action(
            Action::new(cycle, a, ActionKind::UseSkill)
                .with_skill(skill)
                .with_targets(vec![b]),
        );

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);
        let report = runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();

        assert_eq!(report.cycle, cycle);
        assert_eq!(report.performed, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(state.current_cycle(), cycle + 1);
        assert!(state.character(b).unwrap().current_hp < 100);
    }

    #[test]
    fn failed_action_reports_and_spares_the_rest() {
        let (mut state, a, b, skill) = world();
        let cycle = state.current_cycle();
        // b never learned the skill: acceptance rejects it.
        state.submit_action(
            Action::new(cycle, b, ActionKind::UseSkill)
                .with_skill(skill)
                .with_targets(vec![a]),
        );
        state.submit_action(
            Action::new(cycle, a, ActionKind::UseSkill)
                .with_skill(skill)
                .with_targets(vec![b]),
        );

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);
        let report = runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();

        assert_eq!(report.performed, 1);
        assert!(notifier.drain().iter().any(|e| matches!(
            e,
            DomainEvent::ActionFailed {
                code: "ACTION_SKILL_NOT_LEARNED",
                ..
            }
        )));
    }

    #[test]
    fn post_refills_action_points() {
        let (mut state, a, _, _) = world();
        state.character_mut(a).unwrap().current_ap = 0;

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();

        // max_ap = 5 + 8/4 = 7.
        assert_eq!(state.character(a).unwrap().current_ap, 7);
    }

    #[test]
    fn knocked_out_characters_get_no_action_points() {
        let (mut state, a, _, _) = world();
        {
            let a = state.character_mut(a).unwrap();
            a.current_hp = 0;
            a.current_ap = 0;
        }
        state
            .effect_templates
            .insert(EffectKind::KnockedOut, EffectTemplate::new(EffectKind::KnockedOut));

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);

        // Falling and lying there: no refill either cycle.
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert_eq!(state.character(a).unwrap().current_ap, 0);
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert_eq!(state.character(a).unwrap().current_ap, 0);
    }

    #[test]
    fn healed_knockout_recovers_instead_of_coma() {
        let (mut state, a, _, _) = world();
        state.character_mut(a).unwrap().current_hp = 0;
        state
            .effect_templates
            .insert(EffectKind::KnockedOut, EffectTemplate::new(EffectKind::KnockedOut));

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);

        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(state.character(a).unwrap().has_effect(EffectKind::KnockedOut));

        // Healed back over zero while down: the next boundary stands them up.
        state.character_mut(a).unwrap().current_hp = 50;
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();

        let a = state.character(a).unwrap();
        assert!(!a.has_effect(EffectKind::KnockedOut));
        assert!(!a.has_effect(EffectKind::Coma));
    }

    #[test]
    fn effect_assigned_in_dispatch_lives_a_full_cycle() {
        let (mut state, a, b, _) = world();
        state
            .effect_templates
            .insert(EffectKind::Burning, EffectTemplate::new(EffectKind::Burning));

        let mut scorch = strike(1);
        scorch.impacts = vec![];
        scorch.effects = vec![crate::skill::EffectAssignment {
            effect: EffectKind::Burning,
            base_chance: 1.0,
            ends_in: ImpactFormula::flat(1.0),
        }];
        let scorch_id = scorch.id;
        state.skills.insert(scorch_id, scorch);
        state.character_mut(a).unwrap().skills.push(scorch_id);

        let cycle = state.current_cycle();
        state.submit_action(
            Action::new(cycle, a, ActionKind::UseSkill)
                .with_skill(scorch_id)
                .with_targets(vec![b]),
        );

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);

        // Assigned during dispatch: the cast cycle must not consume it.
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(state.character(b).unwrap().has_effect(EffectKind::Burning));

        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(!state.character(b).unwrap().has_effect(EffectKind::Burning));
    }

    #[test]
    fn post_clamps_resources_to_their_maxima() {
        let (mut state, a, _, _) = world();
        {
            let a = state.character_mut(a).unwrap();
            a.current_hp = 10_000;
            a.current_energy = 10_000;
        }

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);
        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();

        let (max_hp, max_energy) = {
            let a = state.character(a).unwrap();
            (a.max_hp(), a.max_energy(state.dimension_of(a)))
        };
        let a = state.character(a).unwrap();
        assert_eq!(a.current_hp, max_hp);
        assert_eq!(a.current_energy, max_energy);
    }

    #[test]
    fn post_knocks_out_the_fallen_and_promotes_over_cycles() {
        let (mut state, a, _, _) = world();
        // Player at 0 HP enters Knocked-Out in post.
        state.character_mut(a).unwrap().current_hp = 0;
        state
            .effect_templates
            .insert(EffectKind::KnockedOut, EffectTemplate::new(EffectKind::KnockedOut));

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);

        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(state.character(a).unwrap().has_effect(EffectKind::KnockedOut));

        // Knocked-Out runs its course and promotes to Coma.
        for _ in 0..state.config.knockout_ends_in {
            runner
                .play(&mut state, &IdleScheduler, &notifier, &mut rng)
                .unwrap();
        }
        assert!(state.character(a).unwrap().has_effect(EffectKind::Coma));
    }

    #[test]
    fn shields_decay_and_expire() {
        let (mut state, a, _, _) = world();
        state
            .character_mut(a)
            .unwrap()
            .shields
            .insert(Violation::Physical, ActiveShield::raise(Violation::Physical, 50, 2));

        let runner = CycleRunner::new();
        let notifier = CollectingNotifier::new();
        let mut rng = StdRng::seed_from_u64(2);

        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(state.character(a).unwrap().shields.contains_key(&Violation::Physical));

        runner
            .play(&mut state, &IdleScheduler, &notifier, &mut rng)
            .unwrap();
        assert!(!state.character(a).unwrap().shields.contains_key(&Violation::Physical));
    }
}

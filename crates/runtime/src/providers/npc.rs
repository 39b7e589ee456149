//! NPC behavior strategies.
//!
//! Each schedulable NPC plans a burst of actions for the cycle from a
//! priority chain: restore energy, re-shield, heal, then the behavior's
//! default act. Planning only reads state; the planned actions flow through
//! the normal acceptance path, so an over-planned action is simply rejected
//! there. The loop stops as soon as an iteration leaves the AP budget
//! unchanged.

use rand::{Rng, RngCore};
use tracing::debug;

use engine_core::action::{Action, ActionKind};
use engine_core::cycle::NpcScheduler;
use engine_core::dice::DiceService;
use engine_core::skill::{CostKind, ImpactKind, Skill, SkillPowerEngine};
use engine_core::state::{Behavior, CampaignState, Character, CharacterId};
use engine_core::stats::StatKind;

/// How an aggressive NPC picks among visible enemies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetSelection {
    /// Uniform pick.
    #[default]
    Random,
    /// Focus fire: pick the enemy with the fewest attackers queued this
    /// cycle, building up to two attackers per target.
    TwoToOne,
    /// Strike every visible enemy with one action.
    AggressiveAll,
    /// Pick the enemy with the lowest current HP.
    DefensiveWeakest,
}

/// Planner keyed by the NPC's behavior tag.
pub struct BehaviorScheduler {
    power: SkillPowerEngine,
    selection: TargetSelection,
}

impl BehaviorScheduler {
    pub fn new() -> Self {
        Self {
            power: SkillPowerEngine::new(),
            selection: TargetSelection::default(),
        }
    }

    pub fn with_selection(mut self, selection: TargetSelection) -> Self {
        self.selection = selection;
        self
    }
}

impl Default for BehaviorScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl NpcScheduler for BehaviorScheduler {
    fn plan(
        &self,
        state: &CampaignState,
        npc: CharacterId,
        rng: &mut dyn RngCore,
    ) -> Vec<Action> {
        let Some(character) = state.character(npc) else {
            return Vec::new();
        };
        if !character.is_active || character.is_incapacitated() {
            return Vec::new();
        }
        match character.behavior {
            Behavior::Passive => Vec::new(),
            Behavior::Aggressive | Behavior::Friendly => {
                self.plan_burst(state, character, rng)
            }
        }
    }
}

/// Remaining resources while planning; debited as actions are chosen.
struct Budget {
    ap: i32,
    energy: i32,
}

impl Budget {
    fn affords(&self, skill: &Skill) -> bool {
        skill.cost(CostKind::ActionPoints) <= self.ap
            && skill.cost(CostKind::Energy) <= self.energy
    }

    fn debit(&mut self, skill: &Skill) {
        self.ap -= skill.cost(CostKind::ActionPoints);
        self.energy -= skill.cost(CostKind::Energy);
    }
}

impl BehaviorScheduler {
    fn plan_burst(
        &self,
        state: &CampaignState,
        npc: &Character,
        rng: &mut dyn RngCore,
    ) -> Vec<Action> {
        let cycle = state.current_cycle();
        let mut budget = Budget {
            ap: npc.current_ap,
            energy: npc.current_energy,
        };

        let known: Vec<&Skill> = npc
            .skills
            .iter()
            .filter_map(|id| state.skills.get(id))
            .collect();

        let mut actions = Vec::new();
        while budget.ap > 0 {
            let ap_before = budget.ap;

            let planned = self
                .plan_self_care(state, npc, &known, &budget)
                .or_else(|| match npc.behavior {
                    Behavior::Aggressive => self.plan_attack(state, npc, &known, &budget, rng),
                    Behavior::Friendly => self.plan_support(state, npc, &known, &budget),
                    Behavior::Passive => None,
                });

            let Some((skill, targets)) = planned else {
                break;
            };
            budget.debit(skill);

            actions.push(
                Action::new(cycle, npc.id, ActionKind::UseSkill)
                    .with_skill(skill.id)
                    .with_targets(targets),
            );

            // Uncostly actions would loop forever.
            if budget.ap == ap_before {
                break;
            }
        }

        if !actions.is_empty() {
            debug!(npc = %npc.name, planned = actions.len(), "npc planned actions");
        }
        actions
    }

    /// The self-care chain: energy, shields, then health.
    fn plan_self_care<'a>(
        &self,
        state: &CampaignState,
        npc: &Character,
        known: &[&'a Skill],
        budget: &Budget,
    ) -> Option<(&'a Skill, Vec<CharacterId>)> {
        let config = &state.config;
        let dimension = state.dimension_of(npc);

        let max_energy = npc.max_energy(dimension);
        if (npc.current_energy as f64) < config.npc_energy_threshold * max_energy as f64 {
            if let Some(skill) = self.best_of(known, budget, |s| {
                has_impact(s, ImpactKind::EnergyRestore) && !s.is_aggressive()
            }) {
                return Some((skill, Vec::new()));
            }
        }

        let needs_shield = npc.shields.is_empty()
            || npc
                .shields
                .values()
                .all(|s| s.level() <= config.npc_reshield_level);
        if needs_shield {
            if let Some(skill) = self.best_of(known, budget, |s| has_impact(s, ImpactKind::Shield))
            {
                return Some((skill, Vec::new()));
            }
        }

        if (npc.current_hp as f64) < config.npc_heal_threshold * npc.max_hp() as f64 {
            if let Some(skill) = self.best_of(known, budget, |s| has_impact(s, ImpactKind::Heal)) {
                return Some((skill, Vec::new()));
            }
        }

        None
    }

    /// Aggressive default: best affordable attack against selected visible
    /// enemies.
    fn plan_attack<'a>(
        &self,
        state: &CampaignState,
        npc: &Character,
        known: &[&'a Skill],
        budget: &Budget,
        rng: &mut dyn RngCore,
    ) -> Option<(&'a Skill, Vec<CharacterId>)> {
        let skill = self.best_of(known, budget, |s| s.is_aggressive())?;

        let enemies: Vec<&Character> = potential_enemies(state, npc)
            .into_iter()
            .filter(|enemy| is_visible(state, npc, enemy, rng))
            .collect();
        if enemies.is_empty() {
            return None;
        }

        let targets = match self.selection {
            TargetSelection::Random => {
                vec![enemies[rng.gen_range(0..enemies.len())].id]
            }
            TargetSelection::AggressiveAll => enemies.iter().map(|e| e.id).collect(),
            TargetSelection::DefensiveWeakest => {
                let weakest = enemies.iter().min_by_key(|e| e.current_hp)?;
                vec![weakest.id]
            }
            TargetSelection::TwoToOne => {
                let cycle = state.current_cycle();
                let least_covered = enemies.iter().min_by_key(|enemy| {
                    state
                        .actions
                        .values()
                        .filter(|a| a.cycle == cycle && a.targets.contains(&enemy.id))
                        .count()
                })?;
                vec![least_covered.id]
            }
        };

        Some((skill, targets))
    }

    /// Friendly default: heal the most wounded co-located ally.
    fn plan_support<'a>(
        &self,
        state: &CampaignState,
        npc: &Character,
        known: &[&'a Skill],
        budget: &Budget,
    ) -> Option<(&'a Skill, Vec<CharacterId>)> {
        let skill = self.best_of(known, budget, |s| {
            has_impact(s, ImpactKind::Heal) && !s.is_aggressive()
        })?;

        let wounded = potential_friends(state, npc)
            .into_iter()
            .filter(|friend| friend.current_hp < friend.max_hp())
            .min_by_key(|friend| friend.current_hp)?;

        Some((skill, vec![wounded.id]))
    }

    /// Highest-rated affordable skill matching the filter.
    fn best_of<'a>(
        &self,
        known: &[&'a Skill],
        budget: &Budget,
        filter: impl Fn(&Skill) -> bool,
    ) -> Option<&'a Skill> {
        known
            .iter()
            .filter(|s| filter(s) && budget.affords(s))
            .copied()
            .max_by(|a, b| {
                self.power
                    .rating(a)
                    .partial_cmp(&self.power.rating(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

/// Co-located active characters outside the NPC's organization.
fn potential_enemies<'a>(state: &'a CampaignState, npc: &Character) -> Vec<&'a Character> {
    let Some(position) = npc.position else {
        return Vec::new();
    };
    state
        .characters_at(position)
        .filter(|c| c.id != npc.id && c.is_active && !c.is_incapacitated())
        .filter(|c| c.organization.is_none() || c.organization != npc.organization)
        .collect()
}

/// Co-located active characters sharing the NPC's organization.
fn potential_friends<'a>(state: &'a CampaignState, npc: &Character) -> Vec<&'a Character> {
    let Some(position) = npc.position else {
        return Vec::new();
    };
    state
        .characters_at(position)
        .filter(|c| c.id != npc.id && c.is_active)
        .filter(|c| c.organization.is_some() && c.organization == npc.organization)
        .collect()
}

/// A target is visible through recent shared actions, or by winning a
/// d20 + speed + luck duel against it.
fn is_visible(
    state: &CampaignState,
    npc: &Character,
    target: &Character,
    rng: &mut dyn RngCore,
) -> bool {
    let cycle = state.current_cycle();
    let window = state.config.visibility_window_cycles;
    let recent = state.actions.values().any(|a| {
        a.performed
            && a.cycle + window >= cycle
            && ((a.initiator == npc.id && a.targets.contains(&target.id))
                || (a.initiator == target.id && a.targets.contains(&npc.id)))
    });
    if recent {
        return true;
    }

    duel_total(npc, rng) > duel_total(target, rng)
}

fn duel_total(character: &Character, rng: &mut dyn RngCore) -> i32 {
    let luck = character.stats.effective(StatKind::Luck);
    let face = DiceService::new(luck, 20).roll(rng).dice_side as i32;
    face + character.stats.effective(StatKind::Speed) + luck
}

fn has_impact(skill: &Skill, kind: ImpactKind) -> bool {
    skill.impacts.iter().any(|i| i.kind == kind)
}

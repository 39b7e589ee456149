//! Fight lifecycle: detection, joining, leaving, closing.
//!
//! Fights are derived state. Nothing opens a fight directly; a performed
//! hostile action (a fight declaration, an accepted duel, an aggressive
//! skill or item) is detected at the next cycle boundary and paired into a
//! fight. At most one fight is open per position. Every transition publishes
//! a domain event.

use crate::action::{Action, ActionKind};
use crate::events::{DomainEvent, Notifier};
use crate::state::{CampaignState, CharacterId, Fight, FightEndReason, FightId, PendingJoiner};

/// Runs the full fight pass for a cycle boundary, in phase order: detect
/// new fights, process leaves, pull in bystanders, promote pending joiners,
/// close stale fights.
pub fn run_fight_phase(state: &mut CampaignState, detect_in_cycle: u64, notifier: &dyn Notifier) {
    detect_fights(state, detect_in_cycle, notifier);
    process_leaves(state, notifier);
    auto_join_bystanders(state, notifier);
    promote_pending(state, notifier);
    close_stale_fights(state, notifier);

    let cycle = state.current_cycle();
    for fight in state.fights.values_mut().filter(|f| f.open) {
        if fight.created_at_cycle < cycle {
            fight.current_round += 1;
        }
    }
}

/// True when a performed action is the kind of hostility that opens a fight.
fn is_fight_starting(state: &CampaignState, action: &Action) -> bool {
    match action.kind {
        ActionKind::StartFight | ActionKind::AcceptDuelInvitation => true,
        ActionKind::UseSkill => action
            .skill
            .and_then(|s| state.skills.get(&s))
            .map(|s| s.is_aggressive())
            .unwrap_or(false),
        ActionKind::UseItem => action
            .item
            .and_then(|i| state.items.get(&i))
            .map(|i| i.is_aggressive())
            .unwrap_or(false),
        _ => false,
    }
}

/// A character that can stand in a fight: active and not permanently
/// incapacitated. A knocked-out participant still counts; a comatose one
/// does not.
fn is_viable(state: &CampaignState, character: CharacterId) -> bool {
    state
        .character(character)
        .map(|c| {
            c.is_active
                && !c
                    .active_effects()
                    .any(|e| e.kind.is_permanently_incapacitating())
        })
        .unwrap_or(false)
}

/// Scans the given cycle's performed hostile actions and opens fights.
///
/// The first co-located target becomes the defender. Both main roles enter
/// with their action points fully spent; engaging costs the round.
pub fn detect_fights(state: &mut CampaignState, cycle: u64, notifier: &dyn Notifier) {
    let candidates: Vec<(CharacterId, CharacterId)> = state
        .performed_actions_in(cycle)
        .filter(|a| is_fight_starting(state, a))
        .filter_map(|a| a.targets.first().map(|t| (a.initiator, *t)))
        .collect();

    for (attacker, defender) in candidates {
        let Some(position) = state.character(attacker).and_then(|c| c.position) else {
            continue;
        };
        let co_located = state
            .character(defender)
            .map(|c| c.position == Some(position))
            .unwrap_or(false);
        if !co_located || attacker == defender {
            continue;
        }
        if !is_viable(state, attacker) || !is_viable(state, defender) {
            continue;
        }
        if state.open_fight_at(position).is_some() {
            // The aggression folds into the existing fight instead.
            continue;
        }
        let already_fighting = [attacker, defender].iter().any(|c| {
            state
                .character(*c)
                .and_then(|ch| ch.fight)
                .and_then(|f| state.fights.get(&f))
                .map(|f| f.open)
                .unwrap_or(false)
        });
        if already_fighting {
            continue;
        }

        let current = state.current_cycle();
        let fight = Fight::new(state.campaign.id, position, attacker, defender, current);
        let fight_id = fight.id;
        state.fights.insert(fight_id, fight);

        for role in [attacker, defender] {
            if let Some(character) = state.character_mut(role) {
                character.fight = Some(fight_id);
                character.current_ap = 0;
            }
        }

        tracing::info!(fight = %fight_id, %attacker, %defender, "fight detected");
        notifier.publish(DomainEvent::FightStarted {
            fight: fight_id,
            position,
            cycle: current,
        });
    }
}

/// Queues a character to join a fight next cycle.
pub fn request_join(
    state: &mut CampaignState,
    fight_id: FightId,
    character: CharacterId,
    notifier: &dyn Notifier,
) -> bool {
    let cycle = state.current_cycle();
    let Some(fight) = state.fights.get_mut(&fight_id) else {
        return false;
    };
    if !fight.open || fight.is_participant(character) || fight.is_pending(character) {
        return false;
    }
    fight.pending_join.push(PendingJoiner {
        character,
        queued_at_cycle: cycle,
    });
    let position = fight.position;

    notifier.publish(DomainEvent::CharacterPendingJoinFight {
        fight: fight_id,
        position,
        character,
        cycle,
    });
    notifier.publish(DomainEvent::PendingJoinFight {
        fight: fight_id,
        position,
        character,
        cycle,
    });
    true
}

/// Removes a participant with authorization (their own retreat or a GM's).
///
/// Vacating a main role promotes the oldest pending joiner into it; with
/// nobody to promote, the fight closes.
pub fn leave_fight(
    state: &mut CampaignState,
    fight_id: FightId,
    character: CharacterId,
    notifier: &dyn Notifier,
) {
    let cycle = state.current_cycle();
    let Some(fight) = state.fights.get_mut(&fight_id) else {
        return;
    };
    if !fight.open || !fight.is_participant(character) {
        return;
    }
    let position = fight.position;
    let was_main = fight.remove_participant(character);

    if let Some(c) = state.character_mut(character) {
        c.fight = None;
    }

    notifier.publish(DomainEvent::CharacterLeaveFight {
        fight: fight_id,
        position,
        character,
        cycle,
    });
    notifier.publish(DomainEvent::LeftFight {
        fight: fight_id,
        position,
        character,
        cycle,
    });

    if !was_main {
        return;
    }

    let fight = state.fights.get_mut(&fight_id).expect("fight just looked up");
    match fight.oldest_pending() {
        Some(joiner) => {
            fight.remove_pending(joiner.character);
            fight.participants.push(joiner.character);
            if fight.attacker == character {
                fight.attacker = joiner.character;
            } else {
                fight.defender = joiner.character;
            }
            if let Some(c) = state.character_mut(joiner.character) {
                c.fight = Some(fight_id);
                c.current_ap = 0;
            }
            notifier.publish(DomainEvent::CharacterJoinFight {
                fight: fight_id,
                position,
                character: joiner.character,
                cycle,
            });
            notifier.publish(DomainEvent::JoinedFight {
                fight: fight_id,
                position,
                character: joiner.character,
                cycle,
            });
        }
        None => close_fight(state, fight_id, FightEndReason::NoReplacement, notifier),
    }
}

/// Participants who walked away from the fight position, dropped out of
/// play, or fell permanently incapacitated are treated as having left, so
/// a vacated main role can still be refilled from the pending queue.
fn process_leaves(state: &mut CampaignState, notifier: &dyn Notifier) {
    let departures: Vec<(FightId, CharacterId)> = state
        .fights
        .values()
        .filter(|f| f.open)
        .flat_map(|f| {
            f.participants
                .iter()
                .filter(|&&p| {
                    state
                        .character(p)
                        .map(|c| {
                            c.position != Some(f.position)
                                || !c.is_active
                                || c.active_effects()
                                    .any(|e| e.kind.is_permanently_incapacitating())
                        })
                        .unwrap_or(true)
                })
                .map(move |&p| (f.id, p))
        })
        .collect();

    for (fight, character) in departures {
        leave_fight(state, fight, character, notifier);
    }
}

/// Every active, unengaged, non-incapacitated character standing at a
/// fight position is dragged in: they queue as pending joiners with their
/// action points spent on the spot.
fn auto_join_bystanders(state: &mut CampaignState, notifier: &dyn Notifier) {
    let cycle = state.current_cycle();

    let open_fights: Vec<(FightId, crate::state::PositionId)> = state
        .fights
        .values()
        .filter(|f| f.open)
        .map(|f| (f.id, f.position))
        .collect();

    for (fight_id, position) in open_fights {
        let bystanders: Vec<CharacterId> = state
            .characters_at(position)
            .filter(|c| c.is_active && !c.is_incapacitated() && c.fight.is_none())
            .map(|c| c.id)
            .collect();

        for bystander in bystanders {
            let Some(fight) = state.fights.get_mut(&fight_id) else {
                break;
            };
            if !fight.open || fight.is_participant(bystander) || fight.is_pending(bystander) {
                continue;
            }
            fight.pending_join.push(PendingJoiner {
                character: bystander,
                queued_at_cycle: cycle,
            });
            if let Some(c) = state.character_mut(bystander) {
                c.current_ap = 0;
            }
            notifier.publish(DomainEvent::CharacterPendingJoinFight {
                fight: fight_id,
                position,
                character: bystander,
                cycle,
            });
            notifier.publish(DomainEvent::PendingJoinFight {
                fight: fight_id,
                position,
                character: bystander,
                cycle,
            });
        }
    }
}

/// Promotes pending joiners, oldest first, up to the participant cap. A
/// joiner queued this pass is promoted in this pass; one who moved away,
/// dropped out, or fell incapacitated stays pending for a later boundary.
fn promote_pending(state: &mut CampaignState, notifier: &dyn Notifier) {
    let cycle = state.current_cycle();
    let max = state.config.max_fight_participants;
    let fight_ids: Vec<FightId> = state
        .fights
        .values()
        .filter(|f| f.open && !f.pending_join.is_empty())
        .map(|f| f.id)
        .collect();

    for fight_id in fight_ids {
        let (position, mut queue) = {
            let Some(fight) = state.fights.get(&fight_id) else {
                continue;
            };
            (fight.position, fight.pending_join.clone())
        };
        queue.sort_by_key(|j| j.queued_at_cycle);

        for joiner in queue {
            let at_capacity = state
                .fights
                .get(&fight_id)
                .map(|f| !f.open || f.participants.len() >= max)
                .unwrap_or(true);
            if at_capacity {
                break;
            }
            let Some(character) = state.character(joiner.character) else {
                if let Some(fight) = state.fights.get_mut(&fight_id) {
                    fight.remove_pending(joiner.character);
                }
                continue;
            };
            let eligible = character.is_active
                && !character.is_incapacitated()
                && character.position == Some(position)
                && character.fight.is_none();
            if !eligible {
                continue;
            }

            let Some(fight) = state.fights.get_mut(&fight_id) else {
                break;
            };
            fight.remove_pending(joiner.character);
            fight.participants.push(joiner.character);
            if let Some(c) = state.character_mut(joiner.character) {
                c.fight = Some(fight_id);
                c.current_ap = 0;
            }
            notifier.publish(DomainEvent::CharacterJoinFight {
                fight: fight_id,
                position,
                character: joiner.character,
                cycle,
            });
            notifier.publish(DomainEvent::JoinedFight {
                fight: fight_id,
                position,
                character: joiner.character,
                cycle,
            });
        }
    }
}

/// Records that a participant acted this cycle; inactivity closing keys off
/// this.
pub fn note_fight_activity(state: &mut CampaignState, fight_id: FightId, cycle: u64) {
    if let Some(fight) = state.fights.get_mut(&fight_id) {
        fight.last_action_cycle = fight.last_action_cycle.max(cycle);
    }
}

/// Closes fights that are no longer worth running: too few viable
/// participants, a deserted position, or a full inactivity window with no
/// action from anyone.
pub fn close_stale_fights(state: &mut CampaignState, notifier: &dyn Notifier) {
    let cycle = state.current_cycle();
    let window = state.config.fight_inactivity_cycles;

    let stale: Vec<(FightId, FightEndReason)> = state
        .fights
        .values()
        .filter(|f| f.open)
        .filter_map(|f| {
            let viable = f
                .participants
                .iter()
                .filter(|&&p| is_viable(state, p))
                .count();
            if viable < 2 {
                return Some((f.id, FightEndReason::NotEnoughParticipants));
            }
            let anyone_present = f.participants.iter().any(|&p| {
                state
                    .character(p)
                    .map(|c| c.position == Some(f.position))
                    .unwrap_or(false)
            });
            if !anyone_present {
                return Some((f.id, FightEndReason::PositionDeserted));
            }
            if cycle.saturating_sub(f.last_action_cycle) >= window {
                return Some((f.id, FightEndReason::Inactivity));
            }
            None
        })
        .collect();

    for (fight, reason) in stale {
        close_fight(state, fight, reason, notifier);
    }
}

/// Closes a fight and unlinks every participant.
pub fn close_fight(
    state: &mut CampaignState,
    fight_id: FightId,
    reason: FightEndReason,
    notifier: &dyn Notifier,
) {
    let cycle = state.current_cycle();
    let Some(fight) = state.fights.get_mut(&fight_id) else {
        return;
    };
    if !fight.open {
        return;
    }
    fight.open = false;
    fight.ended_at_cycle = Some(cycle);
    fight.pending_join.clear();
    let position = fight.position;
    let participants = fight.participants.clone();

    for participant in participants {
        if let Some(c) = state.character_mut(participant) {
            if c.fight == Some(fight_id) {
                c.fight = None;
            }
        }
    }

    tracing::info!(fight = %fight_id, ?reason, "fight closed");
    notifier.publish(DomainEvent::FightEnded {
        fight: fight_id,
        position,
        cycle,
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::effect::{force_assign, EffectKind};
    use crate::events::CollectingNotifier;
    use crate::skill::{ImpactFormula, ImpactKind, Skill, SkillCost, SkillImpact, SkillType, Violation};
    use crate::state::{Campaign, Character, Coordinates, Position, SkillId};

    fn aggressive_skill() -> Skill {
        Skill {
            id: SkillId::new(),
            name: "claw".into(),
            grade: 10,
            skill_type: SkillType::Attack,
            school: None,
            costs: vec![SkillCost {
                kind: crate::skill::CostKind::ActionPoints,
                value: 1,
            }],
            impacts: vec![SkillImpact {
                kind: ImpactKind::Damage,
                violation: Violation::Physical,
                formula: ImpactFormula::flat(5.0),
            }],
            effects: vec![],
            special: None,
        }
    }

    fn arena_with_pair() -> (CampaignState, CharacterId, CharacterId, crate::state::PositionId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let arena = state
            .positions
            .insert(Position::new("arena", Coordinates::new(0, 0, 0)));
        let dimension = state.default_dimension;

        let mut a = Character::new("a", dimension);
        a.position = Some(arena);
        a.current_ap = 5;
        let a_id = state.add_character(a);

        let mut b = Character::new("b", dimension);
        b.position = Some(arena);
        b.current_ap = 5;
        let b_id = state.add_character(b);

        (state, a_id, b_id, arena)
    }

    fn performed_attack(state: &mut CampaignState, attacker: CharacterId, target: CharacterId) {
        let skill = aggressive_skill();
        let skill_id = skill.id;
        state.skills.insert(skill_id, skill);
        let cycle = state.current_cycle();
        let mut action = crate::action::Action::new(cycle, attacker, ActionKind::UseSkill)
            .with_skill(skill_id)
            .with_targets(vec![target]);
        action.accepted = true;
        action.performed = true;
        state.submit_action(action);
    }

    #[test]
    fn aggressive_action_opens_a_fight_and_spends_ap() {
        let (mut state, a, b, arena) = arena_with_pair();
        performed_attack(&mut state, a, b);

        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);

        let fight = state.open_fight_at(arena).expect("fight opened");
        assert_eq!(fight.attacker, a);
        assert_eq!(fight.defender, b);
        assert_eq!(state.character(a).unwrap().current_ap, 0);
        assert_eq!(state.character(b).unwrap().current_ap, 0);
        assert!(matches!(
            notifier.drain().as_slice(),
            [DomainEvent::FightStarted { .. }]
        ));
    }

    #[test]
    fn at_most_one_fight_per_position() {
        let (mut state, a, b, arena) = arena_with_pair();
        let dimension = state.default_dimension;
        let mut c = Character::new("c", dimension);
        c.position = Some(arena);
        let c_id = state.add_character(c);
        let mut d = Character::new("d", dimension);
        d.position = Some(arena);
        let d_id = state.add_character(d);

        performed_attack(&mut state, a, b);
        performed_attack(&mut state, c_id, d_id);

        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);

        let open: Vec<_> = state.fights.values().filter(|f| f.open).collect();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn main_role_leave_promotes_oldest_pending() {
        let (mut state, a, b, arena) = arena_with_pair();
        let dimension = state.default_dimension;
        let mut c = Character::new("c", dimension);
        c.position = Some(arena);
        let c_id = state.add_character(c);

        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);
        let fight_id = state.open_fight_at(arena).unwrap().id;

        assert!(request_join(&mut state, fight_id, c_id, &notifier));
        notifier.drain();

        leave_fight(&mut state, fight_id, a, &notifier);

        let fight = &state.fights[&fight_id];
        assert!(fight.open);
        assert_eq!(fight.attacker, c_id);
        assert!(fight.is_participant(c_id));
        assert!(!fight.is_participant(a));
        assert!(state.character(a).unwrap().fight.is_none());
        assert_eq!(state.character(c_id).unwrap().fight, Some(fight_id));
    }

    #[test]
    fn main_role_leave_without_replacement_closes() {
        let (mut state, a, b, arena) = arena_with_pair();
        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);
        let fight_id = state.open_fight_at(arena).unwrap().id;
        notifier.drain();

        leave_fight(&mut state, fight_id, a, &notifier);

        assert!(!state.fights[&fight_id].open);
        let events = notifier.drain();
        assert!(events.iter().any(|e| matches!(
            e,
            DomainEvent::FightEnded {
                reason: FightEndReason::NoReplacement,
                ..
            }
        )));
    }

    #[test]
    fn bystander_is_pended_and_promoted_in_one_pass() {
        let (mut state, a, b, arena) = arena_with_pair();
        let dimension = state.default_dimension;
        // Default behavior, no org: presence alone pulls them in.
        let mut onlooker = Character::new("onlooker", dimension);
        onlooker.position = Some(arena);
        onlooker.current_ap = 6;
        let onlooker_id = state.add_character(onlooker);

        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        run_fight_phase(&mut state, cycle, &notifier);

        let fight = state.open_fight_at(arena).unwrap();
        assert!(fight.is_participant(onlooker_id));
        assert!(!fight.is_pending(onlooker_id));
        assert_eq!(state.character(onlooker_id).unwrap().fight, Some(fight.id));
        assert_eq!(state.character(onlooker_id).unwrap().current_ap, 0);
    }

    #[test]
    fn incapacitated_bystander_stays_out() {
        let (mut state, a, b, arena) = arena_with_pair();
        let dimension = state.default_dimension;
        let mut sleeper = Character::new("sleeper", dimension);
        sleeper.position = Some(arena);
        sleeper.current_ap = 6;
        let sleeper_id = state.add_character(sleeper);
        force_assign(&mut state, sleeper_id, EffectKind::Sleeping, 3);

        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        run_fight_phase(&mut state, cycle, &notifier);

        let fight = state.open_fight_at(arena).unwrap();
        assert!(!fight.is_participant(sleeper_id));
        assert!(!fight.is_pending(sleeper_id));
        assert_eq!(state.character(sleeper_id).unwrap().current_ap, 6);
    }

    #[test]
    fn comatose_main_is_replaced_by_a_pending_joiner() {
        let (mut state, a, b, arena) = arena_with_pair();
        let dimension = state.default_dimension;
        let mut c = Character::new("c", dimension);
        c.position = Some(arena);
        c.current_ap = 4;
        let c_id = state.add_character(c);

        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);
        let fight_id = state.open_fight_at(arena).unwrap().id;
        assert!(request_join(&mut state, fight_id, c_id, &notifier));
        notifier.drain();

        force_assign(&mut state, b, EffectKind::Coma, 5);
        run_fight_phase(&mut state, cycle, &notifier);

        let fight = &state.fights[&fight_id];
        assert!(fight.open);
        assert!(!fight.is_participant(b));
        assert_eq!(fight.defender, c_id);
        assert!(fight.is_participant(c_id));
        assert!(state.character(b).unwrap().fight.is_none());
        assert_eq!(state.character(c_id).unwrap().fight, Some(fight_id));
    }

    #[test]
    fn comatose_participants_are_not_viable() {
        let (mut state, a, b, arena) = arena_with_pair();
        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);
        let fight_id = state.open_fight_at(arena).unwrap().id;
        notifier.drain();

        // Knocked out still counts as standing in the fight.
        force_assign(&mut state, b, EffectKind::KnockedOut, 3);
        close_stale_fights(&mut state, &notifier);
        assert!(state.fights[&fight_id].open);

        // Coma does not.
        force_assign(&mut state, b, EffectKind::Coma, 5);
        close_stale_fights(&mut state, &notifier);
        assert!(!state.fights[&fight_id].open);
        assert!(notifier.drain().iter().any(|e| matches!(
            e,
            DomainEvent::FightEnded {
                reason: FightEndReason::NotEnoughParticipants,
                ..
            }
        )));
    }

    #[test]
    fn inactivity_window_closes_the_fight() {
        let (mut state, a, b, arena) = arena_with_pair();
        performed_attack(&mut state, a, b);
        let notifier = CollectingNotifier::new();
        let cycle = state.current_cycle();
        detect_fights(&mut state, cycle, &notifier);
        let fight_id = state.open_fight_at(arena).unwrap().id;
        notifier.drain();

        for _ in 0..state.config.fight_inactivity_cycles {
            state.advance_cycle();
        }
        close_stale_fights(&mut state, &notifier);

        assert!(!state.fights[&fight_id].open);
        assert!(state.character(a).unwrap().fight.is_none());
    }
}

//! GM challenges: a stat roll against a difficulty.
//!
//! A challenge rolls the named stat on the requested die, with advantage or
//! disadvantage rolling twice and taking the better or worse face. Modifiers
//! are flat adjustments added after the roll. The outcome is structured and
//! logged; it never mutates the campaign.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::info;

use engine_core::dice::{DiceRollResult, DiceService};
use engine_core::state::{CampaignState, CharacterId};
use engine_core::stats::StatKind;

use crate::error::RuntimeError;

/// A named flat adjustment to the challenge total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeModifier {
    pub name: String,
    pub value: i32,
}

/// A challenge issued by a game-master against one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRequest {
    pub target: CharacterId,
    pub difficulty: i32,
    pub dice_sides: u32,
    pub stat: StatKind,
    pub advantage: bool,
    pub disadvantage: bool,
    pub description: String,
    #[serde(default)]
    pub modifiers: Vec<ChallengeModifier>,
}

/// Structured outcome of one resolved challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeOutcome {
    pub target: CharacterId,
    pub roll: DiceRollResult,
    pub stat_value: i32,
    pub modifier_total: i32,
    pub total: i32,
    pub difficulty: i32,
    pub success: bool,
    pub description: String,
}

/// Resolves a challenge against the current state.
pub fn resolve(
    state: &CampaignState,
    request: &ChallengeRequest,
    rng: &mut dyn RngCore,
) -> Result<ChallengeOutcome, RuntimeError> {
    let character = state
        .character(request.target)
        .ok_or(RuntimeError::CharacterNotFound)?;

    let luck = character.stats.effective(StatKind::Luck);
    let die = DiceService::new(luck, request.dice_sides);

    // Advantage and disadvantage together cancel out.
    let roll = match (request.advantage, request.disadvantage) {
        (true, false) => best_of(die.roll(rng), die.roll(rng)),
        (false, true) => worst_of(die.roll(rng), die.roll(rng)),
        _ => die.roll(rng),
    };

    let stat_value = character.stats.effective(request.stat);
    let modifier_total: i32 = request.modifiers.iter().map(|m| m.value).sum();
    let total = roll.dice_side as i32 + stat_value + modifier_total;
    let success = total >= request.difficulty;

    info!(
        target = %request.target,
        stat = request.stat.as_str(),
        face = roll.dice_side,
        total,
        difficulty = request.difficulty,
        success,
        "challenge resolved"
    );

    Ok(ChallengeOutcome {
        target: request.target,
        roll,
        stat_value,
        modifier_total,
        total,
        difficulty: request.difficulty,
        success,
        description: request.description.clone(),
    })
}

fn best_of(a: DiceRollResult, b: DiceRollResult) -> DiceRollResult {
    if a.dice_side >= b.dice_side {
        a
    } else {
        b
    }
}

fn worst_of(a: DiceRollResult, b: DiceRollResult) -> DiceRollResult {
    if a.dice_side <= b.dice_side {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::state::{Campaign, Character};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn world() -> (CampaignState, CharacterId) {
        let mut state = CampaignState::new(Campaign::new("trial"));
        let dimension = state.default_dimension;
        let mut character = Character::new("vex", dimension);
        character.stats.set_base(StatKind::Concentration, 6);
        let id = state.add_character(character);
        (state, id)
    }

    fn request(target: CharacterId, difficulty: i32) -> ChallengeRequest {
        ChallengeRequest {
            target,
            difficulty,
            dice_sides: 20,
            stat: StatKind::Concentration,
            advantage: false,
            disadvantage: false,
            description: "hold the ward".into(),
            modifiers: vec![ChallengeModifier {
                name: "ward focus".into(),
                value: 2,
            }],
        }
    }

    #[test]
    fn total_sums_face_stat_and_modifiers() {
        let (state, id) = world();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = resolve(&state, &request(id, 1), &mut rng).unwrap();

        assert_eq!(outcome.stat_value, 6);
        assert_eq!(outcome.modifier_total, 2);
        assert_eq!(outcome.total, outcome.roll.dice_side as i32 + 6 + 2);
        assert!(outcome.success);
    }

    #[test]
    fn impossible_difficulty_fails() {
        let (state, id) = world();
        let mut rng = StdRng::seed_from_u64(5);
        let outcome = resolve(&state, &request(id, 1_000), &mut rng).unwrap();
        assert!(!outcome.success);
    }

    #[test]
    fn advantage_never_rolls_below_disadvantage() {
        let (state, id) = world();
        for seed in 0..40 {
            let mut adv = request(id, 10);
            adv.advantage = true;
            let mut dis = request(id, 10);
            dis.disadvantage = true;

            // Same seed: both resolutions consume two draws of the same stream.
            let a = resolve(&state, &adv, &mut StdRng::seed_from_u64(seed)).unwrap();
            let d = resolve(&state, &dis, &mut StdRng::seed_from_u64(seed)).unwrap();
            assert!(a.roll.dice_side >= d.roll.dice_side);
        }
    }

    #[test]
    fn unknown_target_is_an_error() {
        let (state, _) = world();
        let mut rng = StdRng::seed_from_u64(5);
        let missing = request(CharacterId::new(), 5);
        assert!(resolve(&state, &missing, &mut rng).is_err());
    }
}

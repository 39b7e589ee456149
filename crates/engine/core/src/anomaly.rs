//! Dimension anomaly resolution.
//!
//! Interacting with an anomaly rolls a luck-biased d20 and maps the raw face
//! through a polarity-specific bucket table. Positive anomalies climb from a
//! backfiring fumble up to a material prize; negative ones shrink from a
//! cursed mauling down to a clean escape. Luck shifts where the face lands,
//! not the table itself. Any interaction marks the anomaly known.

use rand::Rng;

use crate::action::ActionError;
use crate::dice::{DiceRollResult, DiceService};
use crate::effect::{force_assign, EffectKind};
use crate::state::{AnomalyId, AnomalyPolarity, CampaignState, CharacterId, ItemId, ItemKind};
use crate::stats::StatKind;

const ANOMALY_DICE_SIDES: u32 = 20;

/// One grant or penalty applied by an anomaly interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AnomalyImpact {
    Damaged(i32),
    Healed(i32),
    EnergyRestored(i32),
    EnergyDrained(i32),
    EffectApplied(EffectKind),
}

/// What one anomaly interaction did: the roll it came down to, the items
/// handed over, and every impact applied to the character.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AnomalyOutcome {
    pub roll: DiceRollResult,
    pub gained_items: Vec<ItemId>,
    pub gained_impacts: Vec<AnomalyImpact>,
}

/// Resolves one interaction between a character and an anomaly.
pub fn resolve_anomaly(
    state: &mut CampaignState,
    character: CharacterId,
    anomaly: AnomalyId,
    rng: &mut dyn rand::RngCore,
) -> Result<AnomalyOutcome, ActionError> {
    let polarity = {
        let anomaly = state
            .anomalies
            .get_mut(&anomaly)
            .ok_or(ActionError::AnomalyNotFound)?;
        anomaly.known = true;
        anomaly.polarity
    };

    let luck = state
        .character(character)
        .ok_or(ActionError::InitiatorNotFound)?
        .stats
        .effective(StatKind::Luck);
    let roll = DiceService::new(luck, ANOMALY_DICE_SIDES).roll(rng);

    let mut outcome = AnomalyOutcome {
        roll,
        gained_items: Vec::new(),
        gained_impacts: Vec::new(),
    };
    match polarity {
        AnomalyPolarity::Positive => positive_bucket(state, character, &mut outcome, rng),
        AnomalyPolarity::Negative => negative_bucket(state, character, &mut outcome),
    }
    Ok(outcome)
}

/// Positive table over the raw face; even here a fumble bites back.
fn positive_bucket(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    rng: &mut dyn rand::RngCore,
) {
    match outcome.roll.dice_side {
        1 => damage(state, character, outcome, 10),
        2..=4 => {}
        5..=9 => restore_energy(state, character, outcome, 10),
        10..=14 => heal(state, character, outcome, 15),
        15..=17 => {
            force_assign(state, character, EffectKind::Blessed, 5);
            outcome
                .gained_impacts
                .push(AnomalyImpact::EffectApplied(EffectKind::Blessed));
            restore_energy(state, character, outcome, 25);
        }
        _ => grant_item(state, character, outcome, rng),
    }
}

/// Negative table over the raw face; the top bucket escapes unscathed.
fn negative_bucket(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
) {
    match outcome.roll.dice_side {
        1 => {
            force_assign(state, character, EffectKind::Cursed, 5);
            outcome
                .gained_impacts
                .push(AnomalyImpact::EffectApplied(EffectKind::Cursed));
            damage(state, character, outcome, 25);
        }
        2..=4 => damage(state, character, outcome, 18),
        5..=9 => damage(state, character, outcome, 10),
        10..=14 => drain_energy(state, character, outcome, 20),
        15..=17 => drain_energy(state, character, outcome, 10),
        _ => {}
    }
}

/// Hands over one random food or artifact from the campaign catalog.
fn grant_item(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    rng: &mut dyn rand::RngCore,
) {
    let mut candidates: Vec<ItemId> = state
        .items
        .values()
        .filter(|i| matches!(i.kind, ItemKind::Food | ItemKind::Artifact))
        .map(|i| i.id)
        .collect();
    // Map order is arbitrary; the pick must be stable under one seed.
    candidates.sort();
    if candidates.is_empty() {
        tracing::debug!("anomaly has nothing to hand out");
        return;
    }

    let pick = candidates[rng.gen_range(0..candidates.len())];
    if let Some(c) = state.character_mut(character) {
        c.items.push(pick);
    }
    outcome.gained_items.push(pick);
}

fn damage(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    size: i32,
) {
    if let Some(c) = state.character_mut(character) {
        c.current_hp -= size;
    }
    outcome.gained_impacts.push(AnomalyImpact::Damaged(size));
}

fn heal(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    size: i32,
) {
    let Some(c) = state.character(character) else {
        return;
    };
    let max = c.max_hp();
    if let Some(c) = state.character_mut(character) {
        c.current_hp = (c.current_hp + size).min(max);
    }
    outcome.gained_impacts.push(AnomalyImpact::Healed(size));
}

fn restore_energy(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    size: i32,
) {
    let Some(c) = state.character(character) else {
        return;
    };
    let max = c.max_energy(state.dimension_of(c));
    if let Some(c) = state.character_mut(character) {
        c.current_energy = (c.current_energy + size).min(max);
    }
    outcome
        .gained_impacts
        .push(AnomalyImpact::EnergyRestored(size));
}

fn drain_energy(
    state: &mut CampaignState,
    character: CharacterId,
    outcome: &mut AnomalyOutcome,
    size: i32,
) {
    if let Some(c) = state.character_mut(character) {
        c.current_energy = (c.current_energy - size).max(0);
    }
    outcome
        .gained_impacts
        .push(AnomalyImpact::EnergyDrained(size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::RollOutcome;
    use crate::state::{Campaign, Character, Coordinates, DimensionAnomaly, Item, Position};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rift_world() -> (CampaignState, CharacterId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let rift = state
            .positions
            .insert(Position::new("rift", Coordinates::new(4, 4, 0)));
        let dimension = state.default_dimension;

        let mut character = Character::new("seer", dimension);
        character.position = Some(rift);
        character.current_hp = 100;
        let character_id = state.add_character(character);
        (state, character_id)
    }

    fn faced(face: u32) -> AnomalyOutcome {
        AnomalyOutcome {
            roll: DiceRollResult {
                dice_side: face,
                multiplier: 1.0,
                outcome: RollOutcome::BaseValue,
            },
            gained_items: Vec::new(),
            gained_impacts: Vec::new(),
        }
    }

    #[test]
    fn interaction_marks_anomaly_known() {
        let (mut state, character_id) = rift_world();
        let rift = state.character(character_id).unwrap().position.unwrap();
        let anomaly = DimensionAnomaly::new("shimmer", rift, AnomalyPolarity::Positive);
        let anomaly_id = anomaly.id;
        state.anomalies.insert(anomaly_id, anomaly);

        let mut rng = StdRng::seed_from_u64(9);
        resolve_anomaly(&mut state, character_id, anomaly_id, &mut rng).unwrap();
        assert!(state.anomalies[&anomaly_id].known);
    }

    #[test]
    fn negative_buckets_never_grant() {
        let (mut state, character_id) = rift_world();
        {
            let c = state.character_mut(character_id).unwrap();
            c.current_hp = 500;
            c.current_energy = 500;
        }
        let rift = state.character(character_id).unwrap().position.unwrap();
        let anomaly = DimensionAnomaly::new("maw", rift, AnomalyPolarity::Negative);
        let anomaly_id = anomaly.id;
        state.anomalies.insert(anomaly_id, anomaly);

        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let outcome = resolve_anomaly(&mut state, character_id, anomaly_id, &mut rng).unwrap();
            assert!(outcome.gained_items.is_empty());
            assert!(!outcome.gained_impacts.iter().any(|i| matches!(
                i,
                AnomalyImpact::Healed(_) | AnomalyImpact::EnergyRestored(_)
            )));
        }
        let character = state.character(character_id).unwrap();
        assert!(character.current_hp <= 500);
        assert!(character.current_energy <= 500);
    }

    #[test]
    fn top_positive_bucket_grants_a_catalog_item() {
        let (mut state, character_id) = rift_world();
        let ration = Item::new("ration", ItemKind::Food);
        let relic = Item::new("relic", ItemKind::Artifact);
        let map = Item::new("map", ItemKind::Quest);
        for item in [ration, relic, map] {
            state.items.insert(item.id, item);
        }

        let mut rng = StdRng::seed_from_u64(3);
        for face in [18, 19, 20] {
            let mut outcome = faced(face);
            positive_bucket(&mut state, character_id, &mut outcome, &mut rng);

            assert_eq!(outcome.gained_items.len(), 1);
            let granted = outcome.gained_items[0];
            assert!(state.character(character_id).unwrap().owns_item(granted));
            assert!(matches!(
                state.items[&granted].kind,
                ItemKind::Food | ItemKind::Artifact
            ));
        }
    }

    #[test]
    fn bucket_tables_follow_the_raw_face() {
        let (mut state, character_id) = rift_world();
        let mut rng = StdRng::seed_from_u64(5);

        // Worst negative face: cursed and mauled.
        let mut worst = faced(1);
        negative_bucket(&mut state, character_id, &mut worst);
        assert!(worst
            .gained_impacts
            .contains(&AnomalyImpact::EffectApplied(EffectKind::Cursed)));
        assert!(worst.gained_impacts.contains(&AnomalyImpact::Damaged(25)));

        // Middle faces drain less than the lower ones wound.
        let mut middle = faced(12);
        negative_bucket(&mut state, character_id, &mut middle);
        assert_eq!(middle.gained_impacts, vec![AnomalyImpact::EnergyDrained(20)]);
        let mut high = faced(16);
        negative_bucket(&mut state, character_id, &mut high);
        assert_eq!(high.gained_impacts, vec![AnomalyImpact::EnergyDrained(10)]);

        // Top negative face escapes clean.
        let mut escape = faced(20);
        negative_bucket(&mut state, character_id, &mut escape);
        assert!(escape.gained_impacts.is_empty());

        // Positive fumble still bites.
        let mut fumble = faced(1);
        positive_bucket(&mut state, character_id, &mut fumble, &mut rng);
        assert_eq!(fumble.gained_impacts, vec![AnomalyImpact::Damaged(10)]);

        // Low positive faces give nothing.
        let mut low = faced(3);
        positive_bucket(&mut state, character_id, &mut low, &mut rng);
        assert!(low.gained_impacts.is_empty());
        assert!(low.gained_items.is_empty());
    }
}

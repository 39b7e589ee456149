//! Stored stats and transient modifiers.

use std::collections::HashMap;

use strum::EnumIter;

use crate::state::ActiveEffectId;

/// The closed set of ten character stats.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum StatKind {
    PhysicalStrength,
    MentalStrength,
    FlowResonance,
    Concentration,
    FlowManipulation,
    FlowConnection,
    Knowledge,
    Speed,
    Luck,
    Charisma,
}

impl StatKind {
    /// Display name matching the tabletop sheets.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PhysicalStrength => "Physical Strength",
            Self::MentalStrength => "Mental Strength",
            Self::FlowResonance => "Flow Resonance",
            Self::Concentration => "Concentration",
            Self::FlowManipulation => "Flow Manipulation",
            Self::FlowConnection => "Flow Connection",
            Self::Knowledge => "Knowledge",
            Self::Speed => "Speed",
            Self::Luck => "Luck",
            Self::Charisma => "Charisma",
        }
    }
}

/// A stored stat value, unique per `(character, kind)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Stat {
    pub base_value: i32,
    /// Earned on top of the base (training, items, GM grants).
    pub additional_value: i32,
}

impl Stat {
    pub const fn new(base_value: i32) -> Self {
        Self {
            base_value,
            additional_value: 0,
        }
    }

    /// Stored value without transient modifiers.
    pub const fn stored(&self) -> i32 {
        self.base_value + self.additional_value
    }
}

/// A transient stat adjustment, optionally owned by an active effect.
///
/// Modifiers linked to an effect are garbage-collected when the effect is
/// marked inactive.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatModifier {
    pub kind: StatKind,
    pub value: i32,
    pub source_effect: Option<ActiveEffectId>,
}

/// The full stat sheet of one character.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatBlock {
    stats: HashMap<StatKind, Stat>,
    modifiers: Vec<StatModifier>,
}

impl StatBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a block with uniform base values for every stat.
    pub fn uniform(base_value: i32) -> Self {
        use strum::IntoEnumIterator;
        let mut block = Self::new();
        for kind in StatKind::iter() {
            block.set_base(kind, base_value);
        }
        block
    }

    pub fn set_base(&mut self, kind: StatKind, base_value: i32) {
        self.stats.entry(kind).or_default().base_value = base_value;
    }

    pub fn add_additional(&mut self, kind: StatKind, delta: i32) {
        self.stats.entry(kind).or_default().additional_value += delta;
    }

    pub fn stat(&self, kind: StatKind) -> Stat {
        self.stats.get(&kind).copied().unwrap_or_default()
    }

    /// Stored value plus active modifier contributions.
    pub fn effective(&self, kind: StatKind) -> i32 {
        let stored = self.stat(kind).stored();
        let modifier_sum: i32 = self
            .modifiers
            .iter()
            .filter(|m| m.kind == kind)
            .map(|m| m.value)
            .sum();
        stored + modifier_sum
    }

    /// Upserts an effect-linked modifier: one entry per (effect, stat).
    pub fn upsert_modifier(&mut self, modifier: StatModifier) {
        if let Some(existing) = self.modifiers.iter_mut().find(|m| {
            m.kind == modifier.kind && m.source_effect == modifier.source_effect
        }) {
            existing.value = modifier.value;
        } else {
            self.modifiers.push(modifier);
        }
    }

    /// Drops every modifier owned by the given effect.
    pub fn remove_effect_modifiers(&mut self, effect: ActiveEffectId) {
        self.modifiers
            .retain(|m| m.source_effect != Some(effect));
    }

    pub fn modifiers(&self) -> &[StatModifier] {
        &self.modifiers
    }

    /// Resets every stat to its base value, clearing earned bonuses.
    ///
    /// Transient modifiers are untouched; they expire with their effects.
    pub fn reset_to_base(&mut self) {
        for stat in self.stats.values_mut() {
            stat.additional_value = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_includes_modifiers() {
        let mut block = StatBlock::new();
        block.set_base(StatKind::Speed, 10);
        block.add_additional(StatKind::Speed, 2);

        let effect = ActiveEffectId::new();
        block.upsert_modifier(StatModifier {
            kind: StatKind::Speed,
            value: -4,
            source_effect: Some(effect),
        });

        assert_eq!(block.effective(StatKind::Speed), 8);

        block.remove_effect_modifiers(effect);
        assert_eq!(block.effective(StatKind::Speed), 12);
    }

    #[test]
    fn upsert_replaces_same_effect_entry() {
        let mut block = StatBlock::new();
        let effect = ActiveEffectId::new();
        for value in [3, 5] {
            block.upsert_modifier(StatModifier {
                kind: StatKind::Luck,
                value,
                source_effect: Some(effect),
            });
        }
        assert_eq!(block.modifiers().len(), 1);
        assert_eq!(block.effective(StatKind::Luck), 5);
    }
}

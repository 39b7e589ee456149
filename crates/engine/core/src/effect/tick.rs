//! Per-effect tick handlers.
//!
//! Each effect kind resolves to a tick handler through a keyed registry.
//! Handlers run while the effect applies and once more when it finishes;
//! finishing may transition the character (Knocked-Out promotes to Coma,
//! Coma recovers and teleports to safety).

use std::collections::HashMap;

use super::assign::force_assign;
use super::EffectKind;
use crate::skill::ImpactKind;
use crate::state::{
    ActiveEffectId, CampaignState, CharacterId, DEFAULT_SAFE_COORDINATES,
};

/// Behavior of one effect kind across its lifetime.
pub trait EffectTick: Send + Sync {
    /// Invoked every cycle the effect applies, after `duration` advanced.
    fn tick(&self, state: &mut CampaignState, target: CharacterId, effect: ActiveEffectId);

    /// Invoked once when `duration` has reached `ends_in`, before the effect
    /// is deactivated.
    fn on_finish(&self, state: &mut CampaignState, target: CharacterId, effect: ActiveEffectId);
}

/// Registry mapping effect kinds to tick handlers.
///
/// Kinds without an explicit entry fall back to [`DefaultTick`].
pub struct EffectTickRegistry {
    handlers: HashMap<EffectKind, Box<dyn EffectTick>>,
    fallback: Box<dyn EffectTick>,
}

impl EffectTickRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            fallback: Box::new(DefaultTick),
        }
    }

    /// Registry with the built-in Knocked-Out and Coma handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(EffectKind::KnockedOut, Box::new(KnockedOutTick));
        registry.register(EffectKind::Coma, Box::new(ComaTick));
        registry
    }

    pub fn register(&mut self, kind: EffectKind, handler: Box<dyn EffectTick>) {
        self.handlers.insert(kind, handler);
    }

    pub fn handler(&self, kind: EffectKind) -> &dyn EffectTick {
        self.handlers
            .get(&kind)
            .map(|h| h.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

impl Default for EffectTickRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Built-in handlers
// ============================================================================

/// Applies the effect's recorded per-cycle impact, if any.
///
/// Effect damage bypasses shields; it burns from within.
pub struct DefaultTick;

impl EffectTick for DefaultTick {
    fn tick(&self, state: &mut CampaignState, target: CharacterId, effect: ActiveEffectId) {
        let Some(character) = state.character(target) else {
            return;
        };
        let Some(impact) = character
            .effects
            .iter()
            .find(|e| e.id == effect)
            .and_then(|e| e.impact)
        else {
            return;
        };

        let max_hp = character.max_hp();
        let max_energy = character.max_energy(state.dimension_of(character));
        let Some(character) = state.character_mut(target) else {
            return;
        };

        match impact.kind {
            ImpactKind::Heal => {
                character.current_hp = (character.current_hp + impact.size).min(max_hp);
            }
            ImpactKind::EnergyRestore => {
                character.current_energy =
                    (character.current_energy + impact.size).min(max_energy);
            }
            ImpactKind::EnergyDamage => {
                character.current_energy = (character.current_energy - impact.size).max(0);
            }
            _ => {
                character.current_hp -= impact.size;
            }
        }
    }

    fn on_finish(&self, _state: &mut CampaignState, _target: CharacterId, _effect: ActiveEffectId) {}
}

/// Knocked-Out: inert while applicable; promotes to Coma on finish.
pub struct KnockedOutTick;

impl EffectTick for KnockedOutTick {
    fn tick(&self, _state: &mut CampaignState, _target: CharacterId, _effect: ActiveEffectId) {}

    fn on_finish(&self, state: &mut CampaignState, target: CharacterId, _effect: ActiveEffectId) {
        let ends_in = state.config.coma_ends_in;
        force_assign(state, target, EffectKind::Coma, ends_in);
        tracing::debug!(%target, "knocked-out ran out, promoting to coma");
    }
}

/// Coma: inert while applicable; recovery on finish.
///
/// Players wake at 1 HP with an energy grant and are teleported to their last
/// safe position (or the default safe position). NPCs are deactivated, or
/// removed entirely when a spawner created them.
pub struct ComaTick;

impl EffectTick for ComaTick {
    fn tick(&self, _state: &mut CampaignState, _target: CharacterId, _effect: ActiveEffectId) {}

    fn on_finish(&self, state: &mut CampaignState, target: CharacterId, _effect: ActiveEffectId) {
        let Some(character) = state.character(target) else {
            return;
        };

        if character.npc {
            if character.spawned_by_spawner {
                state.characters.remove(&target);
                tracing::debug!(%target, "spawned npc despawned after coma");
            } else if let Some(character) = state.character_mut(target) {
                character.is_active = false;
                tracing::debug!(%target, "npc deactivated after coma");
            }
            return;
        }

        let safe_position = character
            .last_safe_position
            .or_else(|| state.positions.find_by_coordinates(DEFAULT_SAFE_COORDINATES));
        let energy_grant = state.config.coma_energy_grant;
        let max_energy = state.character(target).map(|c| {
            c.max_energy(state.dimension_of(c))
        });

        if let Some(character) = state.character_mut(target) {
            character.current_hp = 1;
            character.current_energy = (character.current_energy + energy_grant)
                .min(max_energy.unwrap_or(i32::MAX));
            if let Some(position) = safe_position {
                character.position = Some(position);
            }
        }
    }
}

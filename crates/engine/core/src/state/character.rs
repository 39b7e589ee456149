//! Characters: the central game object.

use std::collections::HashMap;

use crate::effect::{ActiveEffect, EffectKind};
use crate::shield::ActiveShield;
use crate::skill::Violation;
use crate::state::ids::{
    CharacterId, DimensionId, FightId, ItemId, OrganizationId, PositionId, SkillId,
};
use crate::stats::{self, StatBlock};

/// Default behavior tag driving NPC strategy and relation derivation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Behavior {
    #[default]
    Passive,
    Aggressive,
    Friendly,
}

/// The fixed set of character paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum CharacterPath {
    Warrior,
    FlowWeaver,
    Wanderer,
    Scholar,
    Shadow,
    Harmonist,
}

/// Rank: grade 0 (max) to 10 (min) with a sub-rank 0..=100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rank {
    pub grade: u8,
    pub sub_rank: u8,
}

impl Default for Rank {
    fn default() -> Self {
        Self {
            grade: 10,
            sub_rank: 0,
        }
    }
}

/// A world dimension: global speed/energy modifiers and a shift cost.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Dimension {
    pub id: DimensionId,
    pub name: String,
    pub speed_factor: f64,
    pub energy_factor: f64,
    /// Energy debited by a Dimension-Shift action into this dimension.
    pub shift_cost: i32,
}

impl Dimension {
    /// The neutral material plane.
    pub fn material() -> Self {
        Self {
            id: DimensionId::new(),
            name: "Material".into(),
            speed_factor: 1.0,
            energy_factor: 1.0,
            shift_cost: 0,
        }
    }
}

/// A player- or NPC-controlled character and everything it owns.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub position: Option<PositionId>,
    pub dimension: DimensionId,

    pub current_hp: i32,
    pub current_energy: i32,
    pub current_ap: i32,

    pub rank: Rank,
    pub path: Option<CharacterPath>,
    pub organization: Option<OrganizationId>,
    pub behavior: Behavior,
    pub last_safe_position: Option<PositionId>,
    pub npc: bool,

    pub is_active: bool,
    /// NPCs born from a spawner despawn instead of deactivating in Coma.
    pub spawned_by_spawner: bool,
    /// Set while a Reset-Stats action is settling; cleared next prepare.
    pub resetting_base_stats: bool,
    pub fight: Option<FightId>,

    pub stats: StatBlock,
    pub skills: Vec<SkillId>,
    pub schools: Vec<String>,
    pub items: Vec<ItemId>,
    pub effects: Vec<ActiveEffect>,
    pub shields: HashMap<Violation, ActiveShield>,
}

impl Character {
    pub fn new(name: impl Into<String>, dimension: DimensionId) -> Self {
        Self {
            id: CharacterId::new(),
            name: name.into(),
            position: None,
            dimension,
            current_hp: 1,
            current_energy: 0,
            current_ap: 0,
            rank: Rank::default(),
            path: None,
            organization: None,
            behavior: Behavior::default(),
            last_safe_position: None,
            npc: false,
            is_active: true,
            spawned_by_spawner: false,
            resetting_base_stats: false,
            fight: None,
            stats: StatBlock::new(),
            skills: Vec::new(),
            schools: Vec::new(),
            items: Vec::new(),
            effects: Vec::new(),
            shields: HashMap::new(),
        }
    }

    pub fn max_hp(&self) -> i32 {
        stats::max_hit_points(&self.stats)
    }

    pub fn max_energy(&self, dimension: &Dimension) -> i32 {
        stats::max_energy(&self.stats, dimension.energy_factor)
    }

    pub fn max_ap(&self, dimension: &Dimension) -> i32 {
        stats::max_action_points(&self.stats, dimension.speed_factor)
    }

    pub fn is_knocked_out(&self) -> bool {
        self.current_hp <= 0
    }

    /// Active (non-expired, non-deactivated) effects.
    pub fn active_effects(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter().filter(|e| e.active)
    }

    pub fn has_effect(&self, kind: EffectKind) -> bool {
        self.active_effects().any(|e| e.kind == kind)
    }

    /// True when any active effect blocks acting or joining fights.
    pub fn is_incapacitated(&self) -> bool {
        self.active_effects().any(|e| e.kind.is_incapacitating())
    }

    pub fn knows_skill(&self, skill: SkillId) -> bool {
        self.skills.contains(&skill)
    }

    pub fn owns_item(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn knows_school(&self, school: &str) -> bool {
        self.schools.iter().any(|s| s == school)
    }

    /// Clamps current resources into `[.., max]` at a cycle boundary.
    pub fn clamp_resources(&mut self, dimension: &Dimension) {
        self.current_hp = self.current_hp.min(self.max_hp());
        self.current_energy = self.current_energy.min(self.max_energy(dimension));
        self.current_ap = self.current_ap.min(self.max_ap(dimension));
    }
}

//! World state owned by the single-writer cycle pipeline.
//!
//! All world entities live in UUID-keyed maps under [`CampaignState`]; the
//! engine mutates it exclusively from the cycle runner and the acceptance
//! path. Collections that are conceptually join tables (targets, pending
//! joiners, ownership) are plain vectors on their owning entity.

mod campaign;
mod character;
mod fight;
mod game_object;
mod ids;
mod item;
mod position;
mod relation;

pub use campaign::{Campaign, Cycle};
pub use character::{Behavior, Character, CharacterPath, Dimension, Rank};
pub use fight::{Fight, FightEndReason, PendingJoiner};
pub use game_object::{AnomalyPolarity, DimensionAnomaly, GameObjectHeader, GameObjectRef};
pub use ids::{
    ActionId, ActiveEffectId, AnomalyId, CampaignId, CharacterId, DimensionId, FightId, ItemId,
    OrganizationId, PositionId, SkillId,
};
pub use item::{Item, ItemKind};
pub use position::{
    Coordinates, Position, PositionConnection, PositionGraph, DEFAULT_SAFE_COORDINATES,
};
pub use relation::{Organization, Relation, RelationKind, RelationStore};

use std::collections::HashMap;

use crate::action::Action;
use crate::config::EngineConfig;
use crate::effect::{EffectKind, EffectTemplate};
use crate::impact::ActionImpact;
use crate::shield::ShieldTemplate;
use crate::skill::{Skill, Violation};

/// The complete state of one campaign's simulation.
#[derive(Clone, Debug)]
pub struct CampaignState {
    pub campaign: Campaign,
    pub config: EngineConfig,

    pub positions: PositionGraph,
    pub dimensions: HashMap<DimensionId, Dimension>,
    /// Dimension new characters start in; always present.
    pub default_dimension: DimensionId,

    pub characters: HashMap<CharacterId, Character>,
    pub organizations: HashMap<OrganizationId, Organization>,
    pub relations: RelationStore,

    pub skills: HashMap<SkillId, Skill>,
    pub items: HashMap<ItemId, Item>,
    pub effect_templates: HashMap<EffectKind, EffectTemplate>,
    pub shield_templates: HashMap<Violation, ShieldTemplate>,

    pub anomalies: HashMap<AnomalyId, DimensionAnomaly>,
    pub fights: HashMap<FightId, Fight>,
    pub actions: HashMap<ActionId, Action>,
    /// Append-only journal of resolved impacts.
    pub impacts: Vec<ActionImpact>,

    cycles: Vec<Cycle>,
}

impl CampaignState {
    pub fn new(campaign: Campaign) -> Self {
        let material = Dimension::material();
        let default_dimension = material.id;
        let mut dimensions = HashMap::new();
        dimensions.insert(material.id, material);

        Self {
            campaign,
            config: EngineConfig::default(),
            positions: PositionGraph::new(),
            dimensions,
            default_dimension,
            characters: HashMap::new(),
            organizations: HashMap::new(),
            relations: RelationStore::new(),
            skills: HashMap::new(),
            items: HashMap::new(),
            effect_templates: HashMap::new(),
            shield_templates: HashMap::new(),
            anomalies: HashMap::new(),
            fights: HashMap::new(),
            actions: HashMap::new(),
            impacts: Vec::new(),
            cycles: vec![Cycle::first()],
        }
    }

    // ========================================================================
    // Cycles
    // ========================================================================

    /// Number of the single current cycle.
    pub fn current_cycle(&self) -> u64 {
        self.cycles
            .iter()
            .rev()
            .find(|c| c.current)
            .map(|c| c.number)
            .unwrap_or(1)
    }

    /// Supersedes the current cycle with `number + 1`.
    ///
    /// Returns the new cycle number. Numbers are unique and monotonically
    /// increasing; the succeeded cycle becomes immutable history.
    pub fn advance_cycle(&mut self) -> u64 {
        let next = self.current_cycle() + 1;
        for cycle in &mut self.cycles {
            cycle.current = false;
        }
        self.cycles.push(Cycle {
            number: next,
            current: true,
        });
        next
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    // ========================================================================
    // Characters & world objects
    // ========================================================================

    pub fn add_character(&mut self, character: Character) -> CharacterId {
        let id = character.id;
        self.characters.insert(id, character);
        id
    }

    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters.get(&id)
    }

    pub fn character_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.get_mut(&id)
    }

    /// The dimension a character currently occupies, falling back to the
    /// campaign default when its id dangles.
    pub fn dimension_of(&self, character: &Character) -> &Dimension {
        self.dimensions
            .get(&character.dimension)
            .unwrap_or_else(|| &self.dimensions[&self.default_dimension])
    }

    /// Characters standing at a position.
    pub fn characters_at(&self, position: PositionId) -> impl Iterator<Item = &Character> {
        self.characters
            .values()
            .filter(move |c| c.position == Some(position))
    }

    /// Other characters co-located with the given one.
    pub fn co_located(&self, character: CharacterId) -> Vec<CharacterId> {
        let Some(position) = self.character(character).and_then(|c| c.position) else {
            return Vec::new();
        };
        self.characters_at(position)
            .filter(|c| c.id != character)
            .map(|c| c.id)
            .collect()
    }

    /// "Suitable" characters for the post phase: active players plus active
    /// NPCs co-located with at least one player.
    pub fn suitable_characters(&self) -> Vec<CharacterId> {
        let player_positions: Vec<PositionId> = self
            .characters
            .values()
            .filter(|c| c.is_active && !c.npc)
            .filter_map(|c| c.position)
            .collect();

        self.characters
            .values()
            .filter(|c| c.is_active)
            .filter(|c| {
                !c.npc
                    || c.position
                        .map(|p| player_positions.contains(&p))
                        .unwrap_or(false)
            })
            .map(|c| c.id)
            .collect()
    }

    /// Every world object as the polymorphic sum type.
    pub fn game_objects(&self) -> impl Iterator<Item = GameObjectRef<'_>> {
        self.characters
            .values()
            .map(GameObjectRef::Character)
            .chain(self.anomalies.values().map(GameObjectRef::Anomaly))
    }

    // ========================================================================
    // Fights
    // ========================================================================

    /// The open fight at a position, if one exists. At most one.
    pub fn open_fight_at(&self, position: PositionId) -> Option<&Fight> {
        self.fights
            .values()
            .find(|f| f.open && f.position == position)
    }

    // ========================================================================
    // Actions & journal
    // ========================================================================

    /// Queues an action for its cycle, returning its id.
    pub fn submit_action(&mut self, action: Action) -> ActionId {
        let id = action.id;
        self.actions.insert(id, action);
        id
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(&id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.get_mut(&id)
    }

    /// Accepted, not-yet-performed actions of a cycle, in dispatch order
    /// (ascending `order`, ties broken by creation time).
    pub fn dispatchable_actions(&self, cycle: u64) -> Vec<ActionId> {
        let mut actions: Vec<&Action> = self
            .actions
            .values()
            .filter(|a| a.cycle == cycle && a.accepted && !a.performed)
            .collect();
        actions.sort_by(|a, b| {
            let oa = a.order.unwrap_or(f64::INFINITY);
            let ob = b.order.unwrap_or(f64::INFINITY);
            oa.partial_cmp(&ob)
                .unwrap_or(core::cmp::Ordering::Equal)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        actions.into_iter().map(|a| a.id).collect()
    }

    /// Performed actions of a cycle that carried an aggressive edge, used by
    /// fight detection.
    pub fn performed_actions_in(&self, cycle: u64) -> impl Iterator<Item = &Action> {
        self.actions
            .values()
            .filter(move |a| a.cycle == cycle && a.performed)
    }

    /// Cancels an un-performed action. Returns false once it was performed.
    pub fn cancel_action(&mut self, id: ActionId) -> bool {
        match self.actions.get(&id) {
            Some(action) if !action.performed => {
                self.actions.remove(&id);
                true
            }
            _ => false,
        }
    }

    /// Appends a row to the impact journal.
    pub fn record_impact(&mut self, impact: ActionImpact) {
        self.impacts.push(impact);
    }
}

//! Item templates.
//!
//! Items with costs and impacts flow through the same impact resolver as
//! skills; quest items carry markers consumed by world services (the
//! cartograph drives the auto-map service).

use crate::skill::{EffectAssignment, SkillCost, SkillImpact};
use crate::state::ids::ItemId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ItemKind {
    Food,
    Artifact,
    Quest,
    Gear,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub kind: ItemKind,
    /// Quest item mirrored into the organization map each prepare phase.
    pub cartograph: bool,
    pub costs: Vec<SkillCost>,
    pub impacts: Vec<SkillImpact>,
    pub effects: Vec<EffectAssignment>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::new(),
            name: name.into(),
            kind,
            cartograph: false,
            costs: Vec::new(),
            impacts: Vec::new(),
            effects: Vec::new(),
        }
    }

    pub fn is_aggressive(&self) -> bool {
        self.impacts.iter().any(|i| i.kind.is_aggressive())
    }
}

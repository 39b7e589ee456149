//! Campaigns and cycles.

use crate::state::ids::{CampaignId, CharacterId, ItemId, PositionId};

/// A simulation instance owning players, game-masters, and the start kit.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub name: String,
    pub start_position: Option<PositionId>,
    /// Item templates granted to every joining character.
    pub start_items: Vec<ItemId>,
    pub players: Vec<CharacterId>,
    pub game_masters: Vec<CharacterId>,
}

impl Campaign {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CampaignId::new(),
            name: name.into(),
            start_position: None,
            start_items: Vec::new(),
            players: Vec::new(),
            game_masters: Vec::new(),
        }
    }
}

/// One tick of the simulation, scoped to a campaign.
///
/// Numbers are monotonically increasing and unique per campaign; at most one
/// cycle is `current`, and a succeeded cycle is immutable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cycle {
    pub number: u64,
    pub current: bool,
}

impl Cycle {
    pub const fn first() -> Self {
        Self {
            number: 1,
            current: true,
        }
    }
}

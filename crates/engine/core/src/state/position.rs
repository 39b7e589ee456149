//! Position graph: nodes with coordinates and directed connections.
//!
//! Movement is discrete, position-to-position. Connections may be locked
//! (requires a key or GM intervention), non-public (hidden from listings),
//! or vertical (requires climbing gear or flight).

use std::collections::HashMap;

use super::ids::PositionId;

/// World coordinates of a position node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Coordinates {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// The fallback safe position `(0, 1, 1)` used when a character has no
/// recorded last safe position.
pub const DEFAULT_SAFE_COORDINATES: Coordinates = Coordinates::new(0, 1, 1);

/// A node in the position graph.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub name: String,
    pub coordinates: Coordinates,
    /// Sub-location within the node (a room, a floor, a clearing).
    pub sub_location: Option<String>,
}

impl Position {
    pub fn new(name: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            id: PositionId::new(),
            name: name.into(),
            coordinates,
            sub_location: None,
        }
    }
}

/// A directed edge between two positions.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PositionConnection {
    pub from: PositionId,
    pub to: PositionId,
    pub locked: bool,
    pub public: bool,
    pub vertical: bool,
}

/// The position graph of a campaign.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct PositionGraph {
    nodes: HashMap<PositionId, Position>,
    connections: Vec<PositionConnection>,
}

impl PositionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, returning its id.
    pub fn insert(&mut self, position: Position) -> PositionId {
        let id = position.id;
        self.nodes.insert(id, position);
        id
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: PositionId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Connects `from` to `to` with a directed edge.
    pub fn connect(&mut self, connection: PositionConnection) {
        self.connections.push(connection);
    }

    /// Returns true when an unlocked directed edge `from -> to` exists.
    pub fn reachable(&self, from: PositionId, to: PositionId) -> bool {
        self.connections
            .iter()
            .any(|c| c.from == from && c.to == to && !c.locked)
    }

    /// Outgoing unlocked neighbors of a node.
    pub fn neighbors(&self, from: PositionId) -> impl Iterator<Item = PositionId> + '_ {
        self.connections
            .iter()
            .filter(move |c| c.from == from && !c.locked)
            .map(|c| c.to)
    }

    /// Finds the node with the given coordinates, if any.
    pub fn find_by_coordinates(&self, coordinates: Coordinates) -> Option<PositionId> {
        self.nodes
            .values()
            .find(|p| p.coordinates == coordinates)
            .map(|p| p.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.nodes.values()
    }
}

//! Relation edges between characters and between organizations.
//!
//! Edges are stored explicitly and never inferred; the recalculation rule in
//! the relation service is authoritative. Immutable edges never change.

use std::collections::{HashMap, HashSet};

use crate::state::ids::{CharacterId, OrganizationId, PositionId};

/// Relation flavor, also used as the behavior derived between two parties.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum RelationKind {
    #[default]
    Passive,
    Friendly,
    Aggressive,
}

/// A directed relation edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Relation {
    pub kind: RelationKind,
    /// Immutable edges are pinned by the GM and never recalculated.
    pub immutable: bool,
}

impl Relation {
    pub const fn new(kind: RelationKind) -> Self {
        Self {
            kind,
            immutable: false,
        }
    }
}

/// An organization: members share a friendly default and a discovered map.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Positions mirrored by cartograph carriers.
    pub discovered_positions: HashSet<PositionId>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            discovered_positions: HashSet::new(),
        }
    }
}

/// Explicit edge storage for both relation graphs.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct RelationStore {
    character_edges: HashMap<(CharacterId, CharacterId), Relation>,
    organization_edges: HashMap<(OrganizationId, OrganizationId), Relation>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn character_edge(&self, from: CharacterId, to: CharacterId) -> Option<Relation> {
        self.character_edges.get(&(from, to)).copied()
    }

    pub fn organization_edge(
        &self,
        from: OrganizationId,
        to: OrganizationId,
    ) -> Option<Relation> {
        self.organization_edges.get(&(from, to)).copied()
    }

    pub fn set_character_edge(&mut self, from: CharacterId, to: CharacterId, relation: Relation) {
        self.character_edges.insert((from, to), relation);
    }

    pub fn set_organization_edge(
        &mut self,
        from: OrganizationId,
        to: OrganizationId,
        relation: Relation,
    ) {
        self.organization_edges.insert((from, to), relation);
    }

    /// All character edges originating from members of `from` toward members
    /// of `to`.
    pub fn character_edges_between<'a>(
        &'a self,
        from_members: &'a [CharacterId],
        to_members: &'a [CharacterId],
    ) -> impl Iterator<Item = Relation> + 'a {
        self.character_edges
            .iter()
            .filter(move |((a, b), _)| from_members.contains(a) && to_members.contains(b))
            .map(|(_, r)| *r)
    }
}

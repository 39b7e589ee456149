//! Polymorphic world objects.
//!
//! The persistence layer may keep per-variant tables, but the engine sees a
//! single sum type with a common identity/position header.

use uuid::Uuid;

use crate::state::character::Character;
use crate::state::ids::{AnomalyId, PositionId};

/// Polarity of a dimension anomaly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AnomalyPolarity {
    Positive,
    Negative,
}

/// A dimension anomaly placed at a world position.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DimensionAnomaly {
    pub id: AnomalyId,
    pub name: String,
    pub position: PositionId,
    pub polarity: AnomalyPolarity,
    /// Set once any character has interacted with it.
    pub known: bool,
}

impl DimensionAnomaly {
    pub fn new(name: impl Into<String>, position: PositionId, polarity: AnomalyPolarity) -> Self {
        Self {
            id: AnomalyId::new(),
            name: name.into(),
            position,
            polarity,
            known: false,
        }
    }
}

/// Common identity/position header shared by every world object.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct GameObjectHeader {
    pub id: Uuid,
    pub name: String,
    pub position: Option<PositionId>,
}

/// A view over any world object, for position scans and inspection.
#[derive(Clone, Copy, Debug)]
pub enum GameObjectRef<'a> {
    Character(&'a Character),
    Anomaly(&'a DimensionAnomaly),
}

impl GameObjectRef<'_> {
    pub fn header(&self) -> GameObjectHeader {
        match self {
            Self::Character(c) => GameObjectHeader {
                id: c.id.0,
                name: c.name.clone(),
                position: c.position,
            },
            Self::Anomaly(a) => GameObjectHeader {
                id: a.id.0,
                name: a.name.clone(),
                position: Some(a.position),
            },
        }
    }

    pub fn position(&self) -> Option<PositionId> {
        match self {
            Self::Character(c) => c.position,
            Self::Anomaly(a) => Some(a.position),
        }
    }
}

//! Typed identifiers for world entities.
//!
//! Every persistent entity is keyed by a UUID wrapped in a newtype so ids of
//! different entity families cannot be confused at compile time.

use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generates a fresh random id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// A simulation instance owning all world entities.
    CampaignId
);
entity_id!(
    /// A player- or NPC-controlled character.
    CharacterId
);
entity_id!(
    /// A node in the position graph.
    PositionId
);
entity_id!(
    /// A skill template.
    SkillId
);
entity_id!(
    /// An item template or owned item instance.
    ItemId
);
entity_id!(
    /// A queued or performed action.
    ActionId
);
entity_id!(
    /// An active effect instance on a character.
    ActiveEffectId
);
entity_id!(
    /// An open or closed fight.
    FightId
);
entity_id!(
    /// A player or NPC organization.
    OrganizationId
);
entity_id!(
    /// A dimension anomaly placed in the world.
    AnomalyId
);
entity_id!(
    /// A world dimension (speed/energy shard).
    DimensionId
);

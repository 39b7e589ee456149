//! Timed effects and their stat modifiers.
//!
//! Effects are identified by a closed enumerated name. Assignment is gated by
//! a d100 against the skill's base chance; active effects tick every cycle
//! they apply, and are marked inactive when `duration` reaches `ends_in`.
//! Stat modifiers introduced by an effect are owned by it and removed when
//! the effect deactivates.

mod assign;
mod tick;

pub use assign::{assign_effect, deactivate_effect, force_assign};
pub use tick::{ComaTick, DefaultTick, EffectTick, EffectTickRegistry, KnockedOutTick};

use strum::EnumIter;

use crate::skill::{ImpactFormula, ImpactKind};
use crate::state::ActiveEffectId;
use crate::stats::StatKind;

/// The closed set of effect names.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, serde::Serialize, serde::Deserialize,
)]
pub enum EffectKind {
    KnockedOut,
    Coma,
    Burning,
    Poisoned,
    Sleeping,
    Confused,
    Paralyzed,
    Fear,
    Slowness,
    Cold,
    Cursed,
    Blindness,
    Haste,
    Regeneration,
    Blessed,
    ArcaneSurge,
    MarkedForDeath,
    None,
}

impl EffectKind {
    /// Effects that stop a character from acting or joining fights.
    pub const fn is_incapacitating(&self) -> bool {
        matches!(
            self,
            Self::KnockedOut | Self::Coma | Self::Sleeping | Self::Paralyzed
        )
    }

    /// Effects that permanently remove a character from a fight.
    pub const fn is_permanently_incapacitating(&self) -> bool {
        matches!(self, Self::Coma)
    }
}

/// Static template for an effect kind.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectTemplate {
    pub kind: EffectKind,
    /// Permanent effects never expire on their own.
    pub permanent: bool,
    /// Default duration in cycles when the assignment carries no formula.
    pub ends_in: Option<u32>,
    /// Stat modifiers introduced on assignment, evaluated against the
    /// initiator's stats.
    pub modifiers: Vec<(StatKind, ImpactFormula)>,
    /// Impact the default tick applies each cycle (burn damage,
    /// regeneration healing).
    pub per_cycle: Option<EffectImpact>,
}

impl EffectTemplate {
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            permanent: false,
            ends_in: None,
            modifiers: Vec::new(),
            per_cycle: None,
        }
    }
}

/// Flat impact an effect applies to its carrier every cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EffectImpact {
    pub kind: ImpactKind,
    pub size: i32,
}

/// An effect instance attached to a character.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActiveEffect {
    pub id: ActiveEffectId,
    pub kind: EffectKind,
    /// Cycles this effect has already applied.
    pub duration: u32,
    /// Total cycles before the effect finishes. Ignored when permanent.
    pub ends_in: u32,
    pub permanent: bool,
    /// Per-cycle impact copied from the template at assignment time.
    pub impact: Option<EffectImpact>,
    pub active: bool,
}

impl ActiveEffect {
    /// Cycles remaining before the effect finishes.
    pub fn cycles_left(&self) -> u32 {
        self.ends_in.saturating_sub(self.duration)
    }

    /// Returns true when a non-permanent effect has run its course.
    pub fn is_finished(&self) -> bool {
        !self.permanent && self.duration >= self.ends_in
    }
}

//! Attribute & stat engine.
//!
//! # Architecture
//!
//! ```text
//! [ Base Stats (stored) ]
//!      ↓
//! [ Effect Modifiers (transient) ]
//!      ↓
//! [ Derived Maximums (HP / Energy / AP) ]
//! ```
//!
//! Stored stats are `base_value + additional_value`; the effective value adds
//! currently-active stat-modifier contributions. Derived maximums are pure
//! functions of effective stats and the character's dimension factors.

mod core;
mod derived;

pub use core::{Stat, StatBlock, StatKind, StatModifier};
pub use derived::{max_action_points, max_energy, max_hit_points};

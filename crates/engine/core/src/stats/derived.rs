//! Derived resource maximums.
//!
//! Pure functions of effective stats and the character's dimension factors.
//! Recomputed on demand, never stored.

use super::{StatBlock, StatKind};

/// Maximum hit points: vitality from physical bulk, backed by mental grit.
pub fn max_hit_points(stats: &StatBlock) -> i32 {
    let physical = stats.effective(StatKind::PhysicalStrength);
    let mental = stats.effective(StatKind::MentalStrength);
    (100 + 5 * physical + 2 * mental).max(1)
}

/// Maximum energy (Flow reserve), scaled by the dimension's energy factor.
pub fn max_energy(stats: &StatBlock, energy_factor: f64) -> i32 {
    let connection = stats.effective(StatKind::FlowConnection);
    let resonance = stats.effective(StatKind::FlowResonance);
    let base = (100 + 5 * connection + 2 * resonance) as f64;
    (base * energy_factor).round().max(1.0) as i32
}

/// Maximum action points per cycle, scaled by the dimension's speed factor.
pub fn max_action_points(stats: &StatBlock, speed_factor: f64) -> i32 {
    let speed = stats.effective(StatKind::Speed);
    let base = (5 + speed / 4) as f64;
    (base * speed_factor).round().max(1.0) as i32
}

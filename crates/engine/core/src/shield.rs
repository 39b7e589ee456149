//! Layered shields keyed by violation kind.
//!
//! One active shield per `(target, violation)`. Level is derived from health
//! through a fixed band table; efficiency is derived from level. Shields lose
//! one cycle of lifetime at every cycle boundary and are destroyed when
//! either `cycles_left` runs out or health drops below zero.

use crate::skill::Violation;

/// Longest lifetime a shield can be assigned, in cycles.
pub const MAX_SHIELD_CYCLES: u32 = 5;

/// Health thresholds for levels 1..=9.
const LEVEL_BANDS: [(i32, u8); 9] = [
    (15, 1),
    (40, 2),
    (70, 3),
    (100, 4),
    (150, 5),
    (200, 6),
    (300, 7),
    (400, 8),
    (500, 9),
];

/// A shield template: starting health and efficiency hint per violation kind.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShieldTemplate {
    pub violation: Violation,
    pub base_health: i32,
    pub base_efficiency: f64,
}

/// A shield raised on a character.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActiveShield {
    pub violation: Violation,
    pub health: i32,
    pub cycles_left: u32,
}

impl ActiveShield {
    /// Raises a shield with `health` and a lifetime capped by the dice face.
    pub fn raise(violation: Violation, health: i32, dice_side: u32) -> Self {
        Self {
            violation,
            health,
            cycles_left: dice_side.min(MAX_SHIELD_CYCLES),
        }
    }

    /// Level 1..=9 derived from current health.
    pub fn level(&self) -> u8 {
        for (threshold, level) in LEVEL_BANDS {
            if self.health <= threshold {
                return level;
            }
        }
        9
    }

    /// Share of incoming damage absorbed by this shield.
    pub fn efficiency(&self) -> f64 {
        match self.level() {
            1 => 0.5,
            2 => 0.75,
            3 => 0.9,
            _ => 1.0,
        }
    }

    /// Ticks the lifetime down one cycle; returns true while still standing.
    pub fn decay(&mut self) -> bool {
        self.cycles_left = self.cycles_left.saturating_sub(1);
        self.cycles_left > 0 && self.health >= 0
    }

    /// Returns true when the shield must be destroyed.
    pub fn is_broken(&self) -> bool {
        self.health < 0 || self.cycles_left == 0
    }
}

//! Luck-biased dice service.
//!
//! A roll draws uniform `1..=sides`, nudges the result by a luck adjustment
//! applied on a coin flip, clamps to the die range, and classifies the
//! outcome into one of five bands around the middle face.

use rand::Rng;

/// Luck value a die considers neutral.
pub const BASE_LUCK: i32 = 10;

/// Outcome classification of a dice roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RollOutcome {
    CriticalFail,
    BadLuck,
    BaseValue,
    GoodLuck,
    CriticalSuccess,
}

impl RollOutcome {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CriticalFail => "Critical Fail",
            Self::BadLuck => "Bad Luck",
            Self::BaseValue => "Base Value",
            Self::GoodLuck => "Good Luck",
            Self::CriticalSuccess => "Critical Success",
        }
    }
}

/// Result of one dice roll.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DiceRollResult {
    /// Face shown after luck adjustment, in `1..=sides`.
    pub dice_side: u32,
    /// Size multiplier applied to impacts resolved with this roll.
    pub multiplier: f64,
    pub outcome: RollOutcome,
}

impl DiceRollResult {
    pub const fn is_critical_fail(&self) -> bool {
        matches!(self.outcome, RollOutcome::CriticalFail)
    }
}

/// A die parameterized by the roller's luck.
#[derive(Clone, Copy, Debug)]
pub struct DiceService {
    luck: i32,
    sides: u32,
    base_luck: i32,
}

impl DiceService {
    pub fn new(luck: i32, sides: u32) -> Self {
        Self {
            luck,
            sides: sides.max(2),
            base_luck: BASE_LUCK,
        }
    }

    /// Draws a face and classifies the outcome.
    pub fn roll(&self, rng: &mut dyn rand::RngCore) -> DiceRollResult {
        let base = rng.gen_range(1..=self.sides) as f64;

        let luck_adjustment = 1.3 * (self.luck - self.base_luck) as f64 / self.base_luck as f64;
        let nudged = rng.gen_bool(0.5);
        let adjusted = if nudged { base + luck_adjustment } else { base };
        let value = adjusted.clamp(1.0, self.sides as f64);

        let (multiplier, outcome) = self.classify(value);

        DiceRollResult {
            dice_side: value.round().clamp(1.0, self.sides as f64) as u32,
            multiplier,
            outcome,
        }
    }

    /// Maps a clamped roll value onto the five outcome bands.
    fn classify(&self, value: f64) -> (f64, RollOutcome) {
        let sides = self.sides as f64;
        let middle = (1.0 + sides) / 2.0;

        if value <= 1.0 {
            (0.5, RollOutcome::CriticalFail)
        } else if value >= sides {
            (2.0, RollOutcome::CriticalSuccess)
        } else if value < middle - 0.5 {
            (0.75, RollOutcome::BadLuck)
        } else if (middle - 0.25..=middle + 0.25).contains(&value) {
            (1.0, RollOutcome::BaseValue)
        } else if value > middle + 0.5 {
            (1.25, RollOutcome::GoodLuck)
        } else {
            (1.0, RollOutcome::BaseValue)
        }
    }
}

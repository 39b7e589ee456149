//! World services layered over the engine: auto-map queries and GM
//! challenges.

pub mod automap;
pub mod challenge;

pub use automap::AutomapService;
pub use challenge::{ChallengeModifier, ChallengeOutcome, ChallengeRequest};

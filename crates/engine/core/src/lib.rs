//! Deterministic campaign simulation core.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! the [`state::CampaignState`] it is handed: the cycle pipeline consumes
//! queued actions, resolves impacts through dice and shields, ticks effects,
//! and derives fights. Randomness enters only through the `RngCore` passed
//! in, and the outside world only hears about it through a [`events::Notifier`].
//!
//! # Architecture
//!
//! ```text
//! [ Actions ] → accept → order → dispatch ─┬→ [ Impacts → Shields → HP ]
//!                                          ├→ [ Effects → Stat modifiers ]
//!                                          └→ [ Fight detection ]
//! ```
//!
//! The async orchestration (worker loop, event bus, NPC providers) lives in
//! the `runtime` crate; content loading lives in `engine-content`.

pub mod action;
pub mod anomaly;
pub mod config;
pub mod cycle;
pub mod dice;
pub mod effect;
pub mod error;
pub mod events;
pub mod fight;
pub mod impact;
pub mod relation;
pub mod shield;
pub mod skill;
pub mod state;
pub mod stats;

pub use action::{Action, ActionError, ActionKind, ActionRegistry};
pub use config::EngineConfig;
pub use cycle::{CycleError, CycleReport, CycleRunner, IdleScheduler, NpcScheduler};
pub use error::{EngineError, ErrorSeverity};
pub use events::{DomainEvent, Notifier, NullNotifier};
pub use state::CampaignState;

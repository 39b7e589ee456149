//! Async orchestration over the deterministic cycle engine.
//!
//! The engine core is synchronous and single-writer; this crate gives it a
//! concurrent face:
//!
//! ```text
//! clients ── RuntimeHandle ──► mpsc ──► CycleWorker (owns CampaignState)
//!                 ▲                          │
//!                 └───── broadcast bus ◄─────┘  (domain events)
//! ```
//!
//! The worker is the only writer. Submissions serialize per initiator in the
//! handle; domain events are published best-effort and never block the
//! engine. NPC planning strategies and player action providers are injected.

pub mod error;
pub mod handle;
pub mod notifier;
pub mod providers;
pub mod runtime;
pub mod services;
pub mod worker;

pub use error::{Result, RuntimeError};
pub use handle::RuntimeHandle;
pub use notifier::BroadcastNotifier;
pub use providers::{ActionProvider, BehaviorScheduler, TargetSelection};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use services::{AutomapService, ChallengeOutcome, ChallengeRequest};

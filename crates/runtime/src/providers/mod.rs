//! Injected action sources.
//!
//! NPC planning is a synchronous strategy injected into the cycle worker;
//! player input arrives through an async [`ActionProvider`] polled by the
//! runtime before each cycle.

pub mod npc;

pub use npc::{BehaviorScheduler, TargetSelection};

use async_trait::async_trait;

use engine_core::action::Action;
use engine_core::state::CampaignState;

/// Async source of player actions for a cycle.
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Actions to queue for `cycle`, decided against a state snapshot.
    async fn provide(&self, state: &CampaignState, cycle: u64) -> Vec<Action>;
}

//! Domain events published to the notifier bus.
//!
//! The engine publishes best-effort and never blocks on delivery;
//! subscribers run in their own concurrency domain.

use crate::state::{ActionId, CharacterId, FightEndReason, FightId, PositionId};

/// Events emitted by the cycle pipeline and fight lifecycle.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DomainEvent {
    FightStarted {
        fight: FightId,
        position: PositionId,
        cycle: u64,
    },
    FightEnded {
        fight: FightId,
        position: PositionId,
        cycle: u64,
        reason: FightEndReason,
    },
    /// Addressed to the character queued for joining.
    CharacterPendingJoinFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    /// Addressed to the fight's audience.
    PendingJoinFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    CharacterJoinFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    JoinedFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    CharacterLeaveFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    LeftFight {
        fight: FightId,
        position: PositionId,
        character: CharacterId,
        cycle: u64,
    },
    /// Surfaced to the initiator when their action failed in dispatch.
    ActionFailed {
        action: ActionId,
        initiator: CharacterId,
        cycle: u64,
        code: &'static str,
        message: String,
    },
}

/// Sink the engine publishes domain events into.
pub trait Notifier: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Notifier that drops every event; useful for tests and offline tools.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _event: DomainEvent) {}
}

/// Notifier that collects events into a mutex-guarded vector.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    events: std::sync::Mutex<Vec<DomainEvent>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<DomainEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl Notifier for CollectingNotifier {
    fn publish(&self, event: DomainEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

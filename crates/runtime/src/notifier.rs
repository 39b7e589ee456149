//! Broadcast-channel notifier.
//!
//! The engine publishes best-effort: a send with no live subscribers is
//! normal during startup and shutdown and is only traced, never an error.
//! Subscribers that lag are dropped by the broadcast channel itself.

use engine_core::events::{DomainEvent, Notifier};
use tokio::sync::broadcast;
use tracing::trace;

/// [`Notifier`] implementation backed by a tokio broadcast channel.
#[derive(Clone, Debug)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<DomainEvent>,
}

impl BroadcastNotifier {
    pub fn new(tx: broadcast::Sender<DomainEvent>) -> Self {
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, event: DomainEvent) {
        if self.tx.send(event).is_err() {
            trace!("domain event dropped, no subscribers");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::state::{CharacterId, FightId, PositionId};

    fn sample_event() -> DomainEvent {
        DomainEvent::CharacterJoinFight {
            fight: FightId::new(),
            position: PositionId::new(),
            character: CharacterId::new(),
            cycle: 4,
        }
    }

    #[test]
    fn delivers_to_subscribers() {
        let (tx, _) = broadcast::channel(8);
        let notifier = BroadcastNotifier::new(tx);
        let mut rx = notifier.subscribe();

        let event = sample_event();
        notifier.publish(event.clone());
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let (tx, rx) = broadcast::channel(8);
        drop(rx);
        let notifier = BroadcastNotifier::new(tx);
        notifier.publish(sample_event());
    }
}

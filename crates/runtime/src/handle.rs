//! Cloneable client façade over the cycle worker.
//!
//! Submission runs under a per-initiator lock: two concurrent submissions
//! for the same character serialize, so acceptance-time resource debits
//! never interleave for one initiator. Distinct initiators proceed in
//! parallel up to the worker's command channel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot, Mutex};

use engine_core::action::Action;
use engine_core::cycle::CycleReport;
use engine_core::events::DomainEvent;
use engine_core::state::{ActionId, CampaignState, CharacterId};

use crate::error::{Result, RuntimeError};
use crate::services::challenge::{ChallengeOutcome, ChallengeRequest};
use crate::worker::Command;

type InitiatorLocks = Arc<Mutex<HashMap<CharacterId, Arc<Mutex<()>>>>>;

/// Handle for issuing commands and subscribing to domain events.
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_tx: broadcast::Sender<DomainEvent>,
    locks: InitiatorLocks,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_tx: broadcast::Sender<DomainEvent>,
    ) -> Self {
        Self {
            command_tx,
            event_tx,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queues an action for the current cycle.
    pub async fn submit_action(&self, action: Action) -> Result<ActionId> {
        let lock = self.initiator_lock(action.initiator).await;
        let _guard = lock.lock().await;

        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::SubmitAction {
                action,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Cancels an un-performed action; false once it was performed.
    pub async fn cancel_action(&self, id: ActionId) -> Result<bool> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::CancelAction { id, reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::ReplyChannelClosed)
    }

    /// Plays one full cycle.
    pub async fn play_cycle(&self) -> Result<CycleReport> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::PlayCycle { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Read-only snapshot of the campaign state.
    pub async fn query_state(&self) -> Result<Box<CampaignState>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::QueryState { reply: reply_tx })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx.await.map_err(|_| RuntimeError::ReplyChannelClosed)
    }

    /// Resolves a GM challenge against a character.
    pub async fn challenge(&self, request: ChallengeRequest) -> Result<ChallengeOutcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Challenge {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;
        reply_rx
            .await
            .map_err(|_| RuntimeError::ReplyChannelClosed)?
    }

    /// Subscribes to the domain event bus.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    async fn initiator_lock(&self, initiator: CharacterId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(initiator).or_default().clone()
    }
}

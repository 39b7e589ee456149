//! The cycle worker: single writer over the campaign state.
//!
//! All mutation funnels through this task. Commands arrive over an mpsc
//! channel; each carries a oneshot reply. Domain events leave through the
//! broadcast notifier. A fatal pipeline error stops the worker; everything
//! else answers the caller and keeps the loop alive.

use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use engine_core::action::Action;
use engine_core::cycle::{CycleReport, CycleRunner, NpcScheduler};
use engine_core::state::{ActionId, CampaignState};

use crate::error::{Result, RuntimeError};
use crate::notifier::BroadcastNotifier;
use crate::services::challenge::{self, ChallengeOutcome, ChallengeRequest};

/// Commands accepted by the cycle worker.
pub enum Command {
    /// Queue an action for the current cycle.
    SubmitAction {
        action: Action,
        reply: oneshot::Sender<Result<ActionId>>,
    },
    /// Cancel an un-performed action. Answers false once it was performed.
    CancelAction {
        id: ActionId,
        reply: oneshot::Sender<bool>,
    },
    /// Play one full cycle.
    PlayCycle {
        reply: oneshot::Sender<Result<CycleReport>>,
    },
    /// Read-only snapshot of the campaign state.
    QueryState {
        reply: oneshot::Sender<Box<CampaignState>>,
    },
    /// Resolve a GM challenge against a character.
    Challenge {
        request: ChallengeRequest,
        reply: oneshot::Sender<Result<ChallengeOutcome>>,
    },
}

/// Background task owning the authoritative [`CampaignState`].
pub struct CycleWorker {
    state: CampaignState,
    runner: CycleRunner,
    scheduler: Box<dyn NpcScheduler>,
    notifier: BroadcastNotifier,
    command_rx: mpsc::Receiver<Command>,
    rng: StdRng,
}

impl CycleWorker {
    pub fn new(
        state: CampaignState,
        scheduler: Box<dyn NpcScheduler>,
        notifier: BroadcastNotifier,
        command_rx: mpsc::Receiver<Command>,
        rng: StdRng,
    ) -> Self {
        info!(
            campaign = %state.campaign.name,
            cycle = state.current_cycle(),
            characters = state.characters.len(),
            "cycle worker initialized"
        );
        Self {
            state,
            runner: CycleRunner::new(),
            scheduler,
            notifier,
            command_rx,
            rng,
        }
    }

    /// Main loop. Returns when every handle is dropped or the pipeline hits
    /// a fatal error.
    pub async fn run(mut self) {
        while let Some(command) = self.command_rx.recv().await {
            if self.handle_command(command).is_err() {
                error!("cycle pipeline is fatal, worker stopping");
                break;
            }
        }
        debug!("cycle worker finished");
    }

    fn handle_command(&mut self, command: Command) -> std::result::Result<(), ()> {
        match command {
            Command::SubmitAction { action, reply } => {
                let result = self.submit(action);
                if reply.send(result).is_err() {
                    debug!("submit reply dropped");
                }
            }
            Command::CancelAction { id, reply } => {
                let cancelled = self.state.cancel_action(id);
                if reply.send(cancelled).is_err() {
                    debug!("cancel reply dropped");
                }
            }
            Command::PlayCycle { reply } => {
                let result = self
                    .runner
                    .play(
                        &mut self.state,
                        self.scheduler.as_ref(),
                        &self.notifier,
                        &mut self.rng,
                    )
                    .map_err(RuntimeError::from);
                let fatal = result.is_err();
                if reply.send(result).is_err() {
                    debug!("play reply dropped");
                }
                if fatal {
                    return Err(());
                }
            }
            Command::QueryState { reply } => {
                if reply.send(Box::new(self.state.clone())).is_err() {
                    debug!("query reply dropped");
                }
            }
            Command::Challenge { request, reply } => {
                let result = challenge::resolve(&self.state, &request, &mut self.rng);
                if reply.send(result).is_err() {
                    debug!("challenge reply dropped");
                }
            }
        }
        Ok(())
    }

    fn submit(&mut self, action: Action) -> Result<ActionId> {
        if self.state.character(action.initiator).is_none() {
            return Err(RuntimeError::CharacterNotFound);
        }
        let cycle = self.state.current_cycle();
        debug!(
            initiator = %action.initiator,
            kind = action.kind.as_snake_case(),
            cycle,
            "action submitted"
        );
        Ok(self.state.submit_action(action))
    }
}

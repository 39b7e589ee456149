//! High-level runtime orchestrator.
//!
//! The runtime owns the cycle worker, wires the command and event channels,
//! and exposes a builder for configuration. [`RuntimeHandle`] is the
//! cloneable client surface.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use engine_core::cycle::{CycleReport, NpcScheduler};
use engine_core::events::DomainEvent;
use engine_core::state::CampaignState;
use engine_content::ContentFactory;

use crate::error::{Result, RuntimeError};
use crate::handle::RuntimeHandle;
use crate::notifier::BroadcastNotifier;
use crate::providers::{ActionProvider, BehaviorScheduler};
use crate::worker::{Command, CycleWorker};

/// Channel sizing and determinism knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when absent.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_buffer_size: 32,
            event_buffer_size: 256,
            rng_seed: None,
        }
    }
}

/// Owns the cycle worker and the optional player action provider.
pub struct Runtime {
    handle: RuntimeHandle,
    player_provider: Option<Box<dyn ActionProvider>>,
    worker_handle: JoinHandle<()>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Cloneable handle for clients and async tasks.
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.handle.subscribe_events()
    }

    /// Polls the player provider, queues its actions, and plays one cycle.
    pub async fn step(&self) -> Result<CycleReport> {
        if let Some(provider) = &self.player_provider {
            let state = self.handle.query_state().await?;
            let cycle = state.current_cycle();
            for action in provider.provide(&state, cycle).await {
                self.handle.submit_action(action).await?;
            }
        }
        self.handle.play_cycle().await
    }

    /// Plays `count` cycles back to back.
    pub async fn run_cycles(&self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.step().await?;
        }
        Ok(())
    }

    pub fn set_player_provider(&mut self, provider: impl ActionProvider + 'static) {
        self.player_provider = Some(Box::new(provider));
    }

    /// Drops the command channel and waits for the worker to drain.
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);
        self.worker_handle.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Runtime`].
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    state: Option<CampaignState>,
    scheduler: Option<Box<dyn NpcScheduler>>,
    player_provider: Option<Box<dyn ActionProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            state: None,
            scheduler: None,
            player_provider: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the worker RNG for reproducible runs.
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.rng_seed = Some(seed);
        self
    }

    /// Starts from a prepared campaign state.
    pub fn initial_state(mut self, state: CampaignState) -> Self {
        self.state = Some(state);
        self
    }

    /// Builds the campaign from an authored content directory.
    pub fn content_dir(
        mut self,
        data_dir: impl Into<std::path::PathBuf>,
        campaign_name: &str,
    ) -> Result<Self> {
        let state = ContentFactory::new(data_dir)
            .build(campaign_name)
            .map_err(|e| RuntimeError::Content(e.to_string()))?;
        self.state = Some(state);
        Ok(self)
    }

    /// Overrides the NPC scheduler; [`BehaviorScheduler`] by default.
    pub fn npc_scheduler(mut self, scheduler: impl NpcScheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    pub fn player_provider(mut self, provider: impl ActionProvider + 'static) -> Self {
        self.player_provider = Some(Box::new(provider));
        self
    }

    /// Spawns the cycle worker and returns the runtime.
    pub fn build(self) -> Result<Runtime> {
        let state = self.state.ok_or(RuntimeError::MissingState)?;
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| Box::new(BehaviorScheduler::new()));

        let (command_tx, command_rx) =
            mpsc::channel::<Command>(self.config.command_buffer_size);
        let (event_tx, _) = broadcast::channel::<DomainEvent>(self.config.event_buffer_size);

        let rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let handle = RuntimeHandle::new(command_tx, event_tx.clone());
        let worker = CycleWorker::new(
            state,
            scheduler,
            BroadcastNotifier::new(event_tx),
            command_rx,
            rng,
        );
        let worker_handle = tokio::spawn(worker.run());

        Ok(Runtime {
            handle,
            player_provider: self.player_provider,
            worker_handle,
        })
    }
}

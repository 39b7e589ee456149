//! Runtime error types.

use engine_core::action::ActionError;
use engine_core::cycle::CycleError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors surfaced to runtime clients.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The worker's command channel is closed; the runtime has shut down.
    #[error("command channel closed")]
    CommandChannelClosed,

    /// The worker dropped the reply channel without answering.
    #[error("reply channel closed")]
    ReplyChannelClosed,

    #[error("action rejected: {0}")]
    Action(#[from] ActionError),

    #[error("cycle pipeline failed: {0}")]
    Cycle(#[from] CycleError),

    #[error("character not found")]
    CharacterNotFound,

    #[error("no initial state: provide a state or a content directory")]
    MissingState,

    #[error("content loading failed: {0}")]
    Content(String),

    #[error("worker task failed to join")]
    WorkerJoin(#[from] tokio::task::JoinError),
}

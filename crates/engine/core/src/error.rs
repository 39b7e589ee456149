//! Common error infrastructure for engine-core.
//!
//! Domain-specific errors (e.g., `ActionError`, `CycleError`) live next to the
//! modules that raise them. This module defines the shared severity taxonomy
//! the dispatcher uses to decide how a failure propagates: validation and
//! game-logic failures are reported to the initiator and never abort the
//! cycle, skipped failures are swallowed after logging, and fatal failures
//! abort the pipeline.

/// Severity level of an engine error, used for propagation decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorSeverity {
    /// Bad input from a client. Reject without mutating state.
    Validation,

    /// Rule violation (missing resources, invalid target, unlearned skill).
    /// Rejected from accept/perform; reported to the initiator; other actions
    /// in the same cycle are unaffected.
    GameLogic,

    /// A subsystem declined to handle an object. Logged and swallowed.
    Skipped,

    /// Failure at a collaborator boundary (storage, bus). Aborts only the
    /// current action and surfaces to the initiator like a game-logic error.
    Infrastructure,

    /// Invariant violation the pipeline cannot continue past.
    Fatal,
}

impl ErrorSeverity {
    /// Human-readable severity label.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::GameLogic => "game-logic",
            Self::Skipped => "skipped",
            Self::Infrastructure => "infrastructure",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if the failure must abort the whole pipeline.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns true if the failure should be reported to the initiator.
    pub const fn reports_to_initiator(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::GameLogic | Self::Infrastructure
        )
    }
}

/// Trait implemented by all engine error types.
///
/// Gives the dispatcher and the runtime a uniform view over domain errors:
/// a severity for propagation and a stable code for logs and client payloads.
pub trait EngineError: core::fmt::Display {
    /// Severity used to decide how the error propagates.
    fn severity(&self) -> ErrorSeverity;

    /// Stable machine-readable error code.
    fn error_code(&self) -> &'static str;
}

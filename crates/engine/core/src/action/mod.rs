//! Action domain: records, registry, dispatch.
//!
//! Players and game-masters submit actions; the engine validates them
//! (`check`), debits their costs and assigns an ordering key (`accept`), and
//! executes them during dispatch (`perform`). Handlers are looked up in a
//! keyed registry, one per [`ActionKind`].

pub mod handler;
pub mod handlers;
pub mod special;

pub use handler::{accept_action, perform_action, ActionHandler, ActionRegistry};

use chrono::{DateTime, Utc};

use crate::error::{EngineError, ErrorSeverity};
use crate::state::{ActionId, CharacterId, FightId, ItemId, PositionId, SkillId};

/// The closed set of action types.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ActionKind {
    UseSkill,
    UseItem,
    DimensionShift,
    ChangePosition,
    StartDialogue,
    MakeDuelInvitation,
    AcceptDuelInvitation,
    RejectDuelInvitation,
    StartFight,
    Move,
    DiceRoll,
    Gift,
    Anomaly,
    GodIntervention,
    LongRest,
    BackToSafeZone,
    Inspect,
    Snatch,
}

impl ActionKind {
    /// snake_case name for logs and journal rows.
    pub const fn as_snake_case(&self) -> &'static str {
        match self {
            Self::UseSkill => "use_skill",
            Self::UseItem => "use_item",
            Self::DimensionShift => "dimension_shift",
            Self::ChangePosition => "change_position",
            Self::StartDialogue => "start_dialogue",
            Self::MakeDuelInvitation => "make_duel_invitation",
            Self::AcceptDuelInvitation => "accept_duel_invitation",
            Self::RejectDuelInvitation => "reject_duel_invitation",
            Self::StartFight => "start_fight",
            Self::Move => "move",
            Self::DiceRoll => "dice_roll",
            Self::Gift => "gift",
            Self::Anomaly => "anomaly",
            Self::GodIntervention => "god_intervention",
            Self::LongRest => "long_rest",
            Self::BackToSafeZone => "back_to_safe_zone",
            Self::Inspect => "inspect",
            Self::Snatch => "snatch",
        }
    }
}

/// A queued, accepted, or performed action.
///
/// Invariants: `performed` implies `accepted`; `order` is assigned exactly
/// once, at acceptance; a performed action is immutable.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub id: ActionId,
    /// Cycle number this action is queued for.
    pub cycle: u64,
    pub initiator: CharacterId,
    pub kind: ActionKind,
    pub targets: Vec<CharacterId>,
    pub skill: Option<SkillId>,
    pub item: Option<ItemId>,
    /// Destination or interaction position, where the kind needs one.
    pub position: Option<PositionId>,
    /// Kind-specific payload from the API boundary.
    pub data: Option<serde_json::Value>,

    /// Dispatch key; lower runs earlier. Set at acceptance.
    pub order: Option<f64>,
    pub accepted: bool,
    pub performed: bool,
    /// Immediate actions skip the queue and dispatch on submission.
    pub immediate: bool,

    pub created_at: DateTime<Utc>,
    /// Fight pinned from the initiator at acceptance time.
    pub fight: Option<FightId>,
}

impl Action {
    pub fn new(cycle: u64, initiator: CharacterId, kind: ActionKind) -> Self {
        Self {
            id: ActionId::new(),
            cycle,
            initiator,
            kind,
            targets: Vec::new(),
            skill: None,
            item: None,
            position: None,
            data: None,
            order: None,
            accepted: false,
            performed: false,
            immediate: false,
            created_at: Utc::now(),
            fight: None,
        }
    }

    pub fn with_targets(mut self, targets: Vec<CharacterId>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_skill(mut self, skill: SkillId) -> Self {
        self.skill = Some(skill);
        self
    }

    pub fn with_item(mut self, item: ItemId) -> Self {
        self.item = Some(item);
        self
    }

    pub fn with_position(mut self, position: PositionId) -> Self {
        self.position = Some(position);
        self
    }
}

/// Errors raised while checking, accepting, or performing actions.
#[derive(Clone, Debug, PartialEq, thiserror::Error, serde::Serialize, serde::Deserialize)]
pub enum ActionError {
    #[error("Action not found")]
    ActionNotFound,

    #[error("Initiator not found")]
    InitiatorNotFound,

    #[error("Initiator is not active")]
    InitiatorInactive,

    #[error("Initiator is incapacitated")]
    InitiatorIncapacitated,

    #[error("Target not found")]
    TargetNotFound,

    #[error("Target is not active")]
    TargetInactive,

    #[error("Target is not at the initiator's position")]
    TargetNotCoLocated,

    #[error("No handler registered for this action kind")]
    HandlerNotFound,

    #[error("Skill is required for this action")]
    SkillRequired,

    #[error("Skill not found")]
    SkillNotFound,

    #[error("Skill is not learned")]
    SkillNotLearned,

    #[error("School '{0}' is not learned")]
    SchoolNotLearned(String),

    #[error("Rank grade {required} required, initiator has {actual}")]
    RankTooLow { required: u8, actual: u8 },

    #[error("Item is required for this action")]
    ItemRequired,

    #[error("Item not found")]
    ItemNotFound,

    #[error("Item is not owned")]
    ItemNotOwned,

    #[error("Position is required for this action")]
    PositionRequired,

    #[error("Position not found")]
    PositionNotFound,

    #[error("Position is not reachable from here")]
    PositionNotReachable,

    #[error("Insufficient {resource}: need {required}, have {available}")]
    InsufficientResources {
        resource: &'static str,
        required: i32,
        available: i32,
    },

    #[error("Action was already accepted")]
    AlreadyAccepted,

    #[error("Action was already performed")]
    AlreadyPerformed,

    #[error("Action was not accepted")]
    NotAccepted,

    #[error("An open fight already exists at this position")]
    FightAlreadyOpen,

    #[error("Relation is immutable")]
    RelationImmutable,

    #[error("Anomaly not found at this position")]
    AnomalyNotFound,

    #[error("Dimension not found")]
    DimensionNotFound,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl EngineError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        use ActionError::*;
        match self {
            ActionNotFound | InitiatorNotFound | TargetNotFound | SkillNotFound
            | ItemNotFound | PositionNotFound | HandlerNotFound | DimensionNotFound
            | InvalidPayload(_) => ErrorSeverity::Validation,
            AnomalyNotFound => ErrorSeverity::Validation,
            SkillRequired | ItemRequired | PositionRequired => ErrorSeverity::Validation,
            InitiatorInactive | InitiatorIncapacitated | TargetInactive
            | TargetNotCoLocated | SkillNotLearned | SchoolNotLearned(_)
            | RankTooLow { .. } | ItemNotOwned | PositionNotReachable
            | InsufficientResources { .. } | AlreadyAccepted | AlreadyPerformed
            | NotAccepted | FightAlreadyOpen | RelationImmutable => ErrorSeverity::GameLogic,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionError::*;
        match self {
            ActionNotFound => "ACTION_NOT_FOUND",
            InitiatorNotFound => "ACTION_INITIATOR_NOT_FOUND",
            InitiatorInactive => "ACTION_INITIATOR_INACTIVE",
            InitiatorIncapacitated => "ACTION_INITIATOR_INCAPACITATED",
            TargetNotFound => "ACTION_TARGET_NOT_FOUND",
            TargetInactive => "ACTION_TARGET_INACTIVE",
            TargetNotCoLocated => "ACTION_TARGET_NOT_CO_LOCATED",
            HandlerNotFound => "ACTION_HANDLER_NOT_FOUND",
            SkillRequired => "ACTION_SKILL_REQUIRED",
            SkillNotFound => "ACTION_SKILL_NOT_FOUND",
            SkillNotLearned => "ACTION_SKILL_NOT_LEARNED",
            SchoolNotLearned(_) => "ACTION_SCHOOL_NOT_LEARNED",
            RankTooLow { .. } => "ACTION_RANK_TOO_LOW",
            ItemRequired => "ACTION_ITEM_REQUIRED",
            ItemNotFound => "ACTION_ITEM_NOT_FOUND",
            ItemNotOwned => "ACTION_ITEM_NOT_OWNED",
            PositionRequired => "ACTION_POSITION_REQUIRED",
            PositionNotFound => "ACTION_POSITION_NOT_FOUND",
            PositionNotReachable => "ACTION_POSITION_NOT_REACHABLE",
            InsufficientResources { .. } => "ACTION_INSUFFICIENT_RESOURCES",
            AlreadyAccepted => "ACTION_ALREADY_ACCEPTED",
            AlreadyPerformed => "ACTION_ALREADY_PERFORMED",
            NotAccepted => "ACTION_NOT_ACCEPTED",
            FightAlreadyOpen => "ACTION_FIGHT_ALREADY_OPEN",
            RelationImmutable => "ACTION_RELATION_IMMUTABLE",
            AnomalyNotFound => "ACTION_ANOMALY_NOT_FOUND",
            DimensionNotFound => "ACTION_DIMENSION_NOT_FOUND",
            InvalidPayload(_) => "ACTION_INVALID_PAYLOAD",
        }
    }
}

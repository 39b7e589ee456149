//! Fights: at most one open fight per position.

use crate::state::ids::{CampaignId, CharacterId, FightId, PositionId};

/// Why a fight was closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FightEndReason {
    /// Fewer than two viable participants remain.
    NotEnoughParticipants,
    /// No participant acted within the inactivity window.
    Inactivity,
    /// No participant is at the fight position anymore.
    PositionDeserted,
    /// A main role was vacated with no pending joiner to promote.
    NoReplacement,
}

/// A pending joiner queued for promotion next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PendingJoiner {
    pub character: CharacterId,
    /// Cycle the character was queued; oldest is promoted first.
    pub queued_at_cycle: u64,
}

/// An open or closed fight at a position.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Fight {
    pub id: FightId,
    pub campaign: CampaignId,
    pub position: PositionId,
    pub attacker: CharacterId,
    pub defender: CharacterId,
    /// Everyone currently in the fight, attacker and defender included.
    pub participants: Vec<CharacterId>,
    pub open: bool,
    pub current_round: u32,
    pub created_at_cycle: u64,
    pub ended_at_cycle: Option<u64>,
    pub pending_join: Vec<PendingJoiner>,
    /// Cycle of the last performed action by any participant.
    pub last_action_cycle: u64,
}

impl Fight {
    pub fn new(
        campaign: CampaignId,
        position: PositionId,
        attacker: CharacterId,
        defender: CharacterId,
        cycle: u64,
    ) -> Self {
        Self {
            id: FightId::new(),
            campaign,
            position,
            attacker,
            defender,
            participants: vec![attacker, defender],
            open: true,
            current_round: 0,
            created_at_cycle: cycle,
            ended_at_cycle: None,
            pending_join: Vec::new(),
            last_action_cycle: cycle,
        }
    }

    pub fn is_participant(&self, character: CharacterId) -> bool {
        self.participants.contains(&character)
    }

    pub fn is_pending(&self, character: CharacterId) -> bool {
        self.pending_join.iter().any(|p| p.character == character)
    }

    /// Removes a participant; returns true when they held a main role.
    pub fn remove_participant(&mut self, character: CharacterId) -> bool {
        self.participants.retain(|c| *c != character);
        character == self.attacker || character == self.defender
    }

    /// Oldest pending joiner, if any.
    pub fn oldest_pending(&self) -> Option<PendingJoiner> {
        self.pending_join
            .iter()
            .min_by_key(|p| p.queued_at_cycle)
            .copied()
    }

    pub fn remove_pending(&mut self, character: CharacterId) {
        self.pending_join.retain(|p| p.character != character);
    }
}

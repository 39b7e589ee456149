//! Engine balance configuration.
//!
//! Tuning knobs the cycle pipeline, fight lifecycle, and NPC behavior read.
//! Content may override the defaults per campaign.

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EngineConfig {
    /// Cycles a Knocked-Out effect lasts before promoting to Coma.
    pub knockout_ends_in: u32,
    /// Cycles a Coma lasts before the character is recovered.
    pub coma_ends_in: u32,
    /// Energy granted when a Coma finishes.
    pub coma_energy_grant: i32,
    /// Cycles without any participant action before a fight closes.
    pub fight_inactivity_cycles: u64,
    /// Hard cap on active fight participants.
    pub max_fight_participants: usize,
    /// Window in which past actions make a target visible to an NPC.
    pub visibility_window_cycles: u64,
    /// NPC tops up energy below this fraction of maximum.
    pub npc_energy_threshold: f64,
    /// NPC heals itself below this fraction of maximum HP.
    pub npc_heal_threshold: f64,
    /// NPC re-shields when every shield is at or below this level.
    pub npc_reshield_level: u8,
    /// Share of aggressive character edges that flips an organization
    /// relation to Aggressive (symmetric for Friendly).
    pub org_relation_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            knockout_ends_in: 3,
            coma_ends_in: 5,
            coma_energy_grant: 50,
            fight_inactivity_cycles: 3,
            max_fight_participants: 8,
            visibility_window_cycles: 5,
            npc_energy_threshold: 0.3,
            npc_heal_threshold: 0.65,
            npc_reshield_level: 2,
            org_relation_threshold: 0.4,
        }
    }
}

//! Auto-map queries over organization discovered-position sets.
//!
//! The mirror itself runs in the cycle prepare phase; this service re-runs
//! it on demand (after a GM moves a character between cycles) and answers
//! map queries for clients.

use engine_core::cycle::mirror_cartographs;
use engine_core::state::{CampaignState, OrganizationId, Position};

pub struct AutomapService;

impl AutomapService {
    /// Re-runs the cartograph mirror outside the cycle pipeline.
    pub fn sweep(state: &mut CampaignState) {
        mirror_cartographs(state);
    }

    /// Positions an organization has discovered, sorted by name.
    pub fn discovered<'a>(
        state: &'a CampaignState,
        organization: OrganizationId,
    ) -> Vec<&'a Position> {
        let Some(org) = state.organizations.get(&organization) else {
            return Vec::new();
        };
        let mut positions: Vec<&Position> = org
            .discovered_positions
            .iter()
            .filter_map(|id| state.positions.get(*id))
            .collect();
        positions.sort_by(|a, b| a.name.cmp(&b.name));
        positions
    }
}

//! Relation service: behavior derivation and edge maintenance.
//!
//! Behavior toward another party resolves in priority order: an explicit
//! character edge wins, then the edge between their organizations, then the
//! subject's default behavior tag. Writing a character edge recalculates the
//! organization edge from the share of member edges, unless the GM pinned it
//! immutable.

use crate::action::ActionError;
use crate::state::{
    Behavior, CampaignState, CharacterId, OrganizationId, Relation, RelationKind,
};

impl From<Behavior> for RelationKind {
    fn from(behavior: Behavior) -> Self {
        match behavior {
            Behavior::Passive => RelationKind::Passive,
            Behavior::Aggressive => RelationKind::Aggressive,
            Behavior::Friendly => RelationKind::Friendly,
        }
    }
}

/// Resolves how `from` behaves toward `to`.
pub fn derive_behavior(state: &CampaignState, from: CharacterId, to: CharacterId) -> RelationKind {
    if from == to {
        return RelationKind::Friendly;
    }
    if let Some(edge) = state.relations.character_edge(from, to) {
        return edge.kind;
    }

    let orgs = (
        state.character(from).and_then(|c| c.organization),
        state.character(to).and_then(|c| c.organization),
    );
    if let (Some(from_org), Some(to_org)) = orgs {
        if from_org == to_org {
            // Members of one organization default to friendly.
            return RelationKind::Friendly;
        }
    }

    // A default aggressor on either side overrides whatever the
    // organizations negotiated; the override only ever escalates.
    let born_hostile = [from, to].into_iter().any(|id| {
        state
            .character(id)
            .map(|c| c.behavior == Behavior::Aggressive)
            .unwrap_or(false)
    });
    if born_hostile {
        return RelationKind::Aggressive;
    }

    if let (Some(from_org), Some(to_org)) = orgs {
        if let Some(edge) = state.relations.organization_edge(from_org, to_org) {
            return edge.kind;
        }
    }

    state
        .character(from)
        .map(|c| c.behavior.into())
        .unwrap_or(RelationKind::Passive)
}

/// Sets a character edge and recalculates the affected organization edge.
pub fn set_character_relation(
    state: &mut CampaignState,
    from: CharacterId,
    to: CharacterId,
    kind: RelationKind,
) -> Result<(), ActionError> {
    if let Some(existing) = state.relations.character_edge(from, to) {
        if existing.immutable {
            return Err(ActionError::RelationImmutable);
        }
    }
    state
        .relations
        .set_character_edge(from, to, Relation::new(kind));

    let orgs = (
        state.character(from).and_then(|c| c.organization),
        state.character(to).and_then(|c| c.organization),
    );
    if let (Some(from_org), Some(to_org)) = orgs {
        if from_org != to_org {
            recalculate_organization_edge(state, from_org, to_org);
        }
    }
    Ok(())
}

fn members_of(state: &CampaignState, organization: OrganizationId) -> Vec<CharacterId> {
    state
        .characters
        .values()
        .filter(|c| c.organization == Some(organization))
        .map(|c| c.id)
        .collect()
}

/// Recalculates one directed organization edge from its member edges.
///
/// The edge turns aggressive when strictly more than the threshold share of
/// member edges is aggressive and aggression outnumbers friendship; the
/// friendly case is symmetric. Anything else settles to passive. Immutable
/// edges stay put.
pub fn recalculate_organization_edge(
    state: &mut CampaignState,
    from: OrganizationId,
    to: OrganizationId,
) {
    if let Some(edge) = state.relations.organization_edge(from, to) {
        if edge.immutable {
            return;
        }
    }

    let from_members = members_of(state, from);
    let to_members = members_of(state, to);
    let edges: Vec<RelationKind> = state
        .relations
        .character_edges_between(&from_members, &to_members)
        .map(|r| r.kind)
        .collect();
    if edges.is_empty() {
        return;
    }

    let threshold = state.config.org_relation_threshold;
    let aggressive = edges.iter().filter(|k| **k == RelationKind::Aggressive).count();
    let friendly = edges.iter().filter(|k| **k == RelationKind::Friendly).count();
    let share = |count: usize| count as f64 / edges.len() as f64;

    let kind = if share(aggressive) > threshold && aggressive > friendly {
        RelationKind::Aggressive
    } else if share(friendly) > threshold && friendly > aggressive {
        RelationKind::Friendly
    } else {
        RelationKind::Passive
    };

    tracing::debug!(?from, ?to, ?kind, "organization edge recalculated");
    state
        .relations
        .set_organization_edge(from, to, Relation::new(kind));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Campaign, Character, Organization};

    fn org_pair() -> (CampaignState, OrganizationId, OrganizationId) {
        let mut state = CampaignState::new(Campaign::new("test"));
        let crows = Organization::new("crows");
        let wolves = Organization::new("wolves");
        let crows_id = crows.id;
        let wolves_id = wolves.id;
        state.organizations.insert(crows_id, crows);
        state.organizations.insert(wolves_id, wolves);
        (state, crows_id, wolves_id)
    }

    fn member(state: &mut CampaignState, organization: OrganizationId) -> CharacterId {
        let dimension = state.default_dimension;
        let mut character = Character::new("m", dimension);
        character.organization = Some(organization);
        state.add_character(character)
    }

    #[test]
    fn explicit_edge_beats_organization_and_default() {
        let (mut state, crows, wolves) = org_pair();
        let a = member(&mut state, crows);
        let b = member(&mut state, wolves);
        state
            .relations
            .set_organization_edge(crows, wolves, Relation::new(RelationKind::Aggressive));

        assert_eq!(derive_behavior(&state, a, b), RelationKind::Aggressive);

        set_character_relation(&mut state, a, b, RelationKind::Friendly).unwrap();
        assert_eq!(derive_behavior(&state, a, b), RelationKind::Friendly);
    }

    #[test]
    fn same_organization_defaults_friendly() {
        let (mut state, crows, _) = org_pair();
        let a = member(&mut state, crows);
        let b = member(&mut state, crows);
        assert_eq!(derive_behavior(&state, a, b), RelationKind::Friendly);
    }

    #[test]
    fn immutable_edge_rejects_writes() {
        let (mut state, crows, wolves) = org_pair();
        let a = member(&mut state, crows);
        let b = member(&mut state, wolves);
        state.relations.set_character_edge(
            a,
            b,
            Relation {
                kind: RelationKind::Passive,
                immutable: true,
            },
        );

        assert_eq!(
            set_character_relation(&mut state, a, b, RelationKind::Aggressive).unwrap_err(),
            ActionError::RelationImmutable
        );
    }

    #[test]
    fn aggressive_share_flips_the_organization_edge() {
        let (mut state, crows, wolves) = org_pair();
        let a1 = member(&mut state, crows);
        let a2 = member(&mut state, crows);
        let a3 = member(&mut state, crows);
        let b = member(&mut state, wolves);

        // 1 of 3 edges aggressive: below the 40% threshold.
        set_character_relation(&mut state, a1, b, RelationKind::Aggressive).unwrap();
        set_character_relation(&mut state, a2, b, RelationKind::Passive).unwrap();
        set_character_relation(&mut state, a3, b, RelationKind::Passive).unwrap();
        assert_eq!(
            state.relations.organization_edge(crows, wolves).unwrap().kind,
            RelationKind::Passive
        );

        // 2 of 3: the edge flips.
        set_character_relation(&mut state, a2, b, RelationKind::Aggressive).unwrap();
        assert_eq!(
            state.relations.organization_edge(crows, wolves).unwrap().kind,
            RelationKind::Aggressive
        );
    }

    #[test]
    fn default_aggressor_overrides_the_organization_edge() {
        let (mut state, crows, wolves) = org_pair();
        let a = member(&mut state, crows);
        let b = member(&mut state, wolves);
        state
            .relations
            .set_organization_edge(crows, wolves, Relation::new(RelationKind::Friendly));

        assert_eq!(derive_behavior(&state, a, b), RelationKind::Friendly);

        // The target being a born aggressor escalates both directions.
        state.character_mut(b).unwrap().behavior = Behavior::Aggressive;
        assert_eq!(derive_behavior(&state, a, b), RelationKind::Aggressive);
        assert_eq!(derive_behavior(&state, b, a), RelationKind::Aggressive);
    }

    #[test]
    fn balanced_shares_settle_passive() {
        let (mut state, crows, wolves) = org_pair();
        let a1 = member(&mut state, crows);
        let a2 = member(&mut state, crows);
        let a3 = member(&mut state, crows);
        let a4 = member(&mut state, crows);
        let b = member(&mut state, wolves);

        // Both shares clear the threshold, but neither kind outnumbers the
        // other.
        set_character_relation(&mut state, a1, b, RelationKind::Aggressive).unwrap();
        set_character_relation(&mut state, a2, b, RelationKind::Aggressive).unwrap();
        set_character_relation(&mut state, a3, b, RelationKind::Friendly).unwrap();
        set_character_relation(&mut state, a4, b, RelationKind::Friendly).unwrap();
        assert_eq!(
            state.relations.organization_edge(crows, wolves).unwrap().kind,
            RelationKind::Passive
        );
    }

    #[test]
    fn exact_threshold_share_does_not_flip() {
        let (mut state, crows, wolves) = org_pair();
        let members: Vec<CharacterId> = (0..5).map(|_| member(&mut state, crows)).collect();
        let b = member(&mut state, wolves);

        // 2 of 5 is exactly the 40% threshold; strictly-greater is required.
        set_character_relation(&mut state, members[0], b, RelationKind::Aggressive).unwrap();
        set_character_relation(&mut state, members[1], b, RelationKind::Aggressive).unwrap();
        for m in &members[2..] {
            set_character_relation(&mut state, *m, b, RelationKind::Passive).unwrap();
        }
        assert_eq!(
            state.relations.organization_edge(crows, wolves).unwrap().kind,
            RelationKind::Passive
        );
    }
}

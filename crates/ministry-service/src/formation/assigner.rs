//! Deterministic formation assignment.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use ministry_core::config::FormationConfig;
use ministry_entity::formation::{FormationRequest, FormationSlot, Participant};

use super::roster::{RosterCatalog, SeatSpec, SharedRole, TeamRoster, normalize_time_slot};
use super::rotation::RotationState;

/// Computes who sits where for one event.
///
/// The same catalog and rotation state must back every caller so that
/// repeat renders of one event agree.
#[derive(Debug, Clone)]
pub struct FormationAssigner {
    /// Static team configuration.
    catalog: Arc<RosterCatalog>,
    /// Shared pair rotation.
    rotation: Arc<RotationState>,
    /// Fallback bucket for teams that declare none.
    default_fallback_time_slot: String,
}

impl FormationAssigner {
    /// Creates a new assigner.
    pub fn new(
        catalog: Arc<RosterCatalog>,
        rotation: Arc<RotationState>,
        config: &FormationConfig,
    ) -> Self {
        Self {
            catalog,
            rotation,
            default_fallback_time_slot: normalize_time_slot(&config.default_fallback_time_slot),
        }
    }

    /// The roster catalog.
    pub fn catalog(&self) -> &RosterCatalog {
        &self.catalog
    }

    /// The pair rotation state.
    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    /// Compute the ordered formation for `request`.
    ///
    /// An unknown team yields an empty list.
    pub fn assign(&self, request: &FormationRequest) -> Vec<FormationSlot> {
        let Some(team) = self.catalog.team(&request.team) else {
            debug!(team = %request.team, "No formation configured for team");
            return Vec::new();
        };
        if team.is_fixed() {
            return numbered(team.fixed_participants());
        }

        let pair_pick = team.pair.as_ref().filter(|_| has_seat(team, &SeatSpec::Pair)).map(|pair| {
            let side = self.rotation.choose(&team.name, &request.entity_id);
            pair.member(side)
        });

        let mut seated: HashSet<&str> = team.fixed_participants().map(|(p, _)| p.id.as_str()).collect();
        if let Some(member) = pair_pick {
            seated.insert(member.id.as_str());
        }

        let lead_pick = team
            .shared_role
            .as_ref()
            .filter(|_| has_seat(team, &SeatSpec::SharedRole))
            .and_then(|role| self.shared_role_candidate(team, role, request, &seated));

        numbered(team.seats.iter().filter_map(|seat| match seat {
            SeatSpec::Fixed {
                participant,
                is_lead,
            } => Some((participant, *is_lead)),
            SeatSpec::SharedRole => lead_pick.map(|p| (p, true)),
            SeatSpec::Pair => pair_pick.map(|p| (p, false)),
        }))
    }

    /// Pick the lead-seat occupant: the scheduled candidate, or the nearest
    /// pool alternative when the scheduled one is the director or already seated.
    fn shared_role_candidate<'a>(
        &self,
        team: &TeamRoster,
        role: &'a SharedRole,
        request: &FormationRequest,
        seated: &HashSet<&str>,
    ) -> Option<&'a Participant> {
        let fallback = role
            .fallback_time_slot
            .as_deref()
            .unwrap_or(&self.default_fallback_time_slot);
        let slot = if role.has_slot(&request.time_slot) {
            request.time_slot.as_str()
        } else {
            debug!(team = %team.name, time_slot = %request.time_slot, fallback, "Using fallback time slot");
            fallback
        };
        let index = role.scheduled_index(slot).unwrap_or(0);

        let director = request.director_id.trim();
        let eligible = |p: &Participant| p.id != director && !seated.contains(p.id.as_str());

        let scheduled = role.pool.get(index)?;
        if eligible(scheduled) {
            return Some(scheduled);
        }

        let len = role.pool.len();
        let alternatives: Vec<&Participant> = (1..len)
            .map(|offset| &role.pool[(index + offset) % len])
            .filter(|p| eligible(*p))
            .collect();

        let substitute = alternatives
            .iter()
            .find(|p| !self.catalog.is_fixed_lead(&p.id))
            .or_else(|| alternatives.first())
            .copied();

        match substitute {
            Some(p) => debug!(
                team = %team.name,
                scheduled = %scheduled.id,
                substitute = %p.id,
                "Lead seat substituted"
            ),
            None => warn!(
                team = %team.name,
                scheduled = %scheduled.id,
                "No eligible lead-seat substitute, seat left out"
            ),
        }
        substitute
    }
}

/// Label seats in order.
fn numbered<'a>(seats: impl Iterator<Item = (&'a Participant, bool)>) -> Vec<FormationSlot> {
    seats
        .enumerate()
        .map(|(index, (participant, is_team_lead))| FormationSlot {
            participant_id: participant.id.clone(),
            participant_name: participant.name.clone(),
            slot_label: FormationSlot::label_for(index),
            is_team_lead,
        })
        .collect()
}

fn has_seat(team: &TeamRoster, kind: &SeatSpec) -> bool {
    team.seats
        .iter()
        .any(|s| std::mem::discriminant(s) == std::mem::discriminant(kind))
}

//! Formation request and output rows.

use serde::{Deserialize, Serialize};

/// Inputs for computing one event's formation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationRequest {
    /// Team name, key into the roster catalog.
    pub team: String,
    /// Time slot of the event (`"08:00"`, `"8:00"`, `"08:00:00"`).
    pub time_slot: String,
    /// Identity of the event director, never seated in the lead slot.
    pub director_id: String,
    /// Identity of the triggering event, drives pair rotation.
    pub entity_id: String,
}

impl FormationRequest {
    /// Build a request.
    pub fn new(
        team: impl Into<String>,
        time_slot: impl Into<String>,
        director_id: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        Self {
            team: team.into(),
            time_slot: time_slot.into(),
            director_id: director_id.into(),
            entity_id: entity_id.into(),
        }
    }
}

/// One ordered row of a computed formation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationSlot {
    /// Seated participant identity.
    pub participant_id: String,
    /// Seated participant display name.
    pub participant_name: String,
    /// Sequential label, unique within one formation (`"Seat #1"`).
    pub slot_label: String,
    /// Whether this seat leads the team.
    pub is_team_lead: bool,
}

impl FormationSlot {
    /// Label for the seat at zero-based `index`.
    pub fn label_for(index: usize) -> String {
        format!("Seat #{}", index + 1)
    }
}

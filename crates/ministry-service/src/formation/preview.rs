//! Formation for a service-program notice.
//!
//! Service-program notices carry the event's team, time and director in
//! their metadata. The overlay renders the formation from that payload
//! through the same assigner the schedule uses, so both always agree.

use serde::{Deserialize, Serialize};
use tracing::warn;

use ministry_core::error::AppError;
use ministry_core::result::AppResult;
use ministry_entity::formation::{FormationRequest, FormationSlot};
use ministry_entity::notice::{Notice, NoticeCategory};

use super::assigner::FormationAssigner;

/// Metadata of a service-program notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceProgramPayload {
    /// Team serving the event.
    #[serde(alias = "teamName")]
    pub team: String,
    /// Event start time.
    #[serde(alias = "timeSlot")]
    pub time_slot: String,
    /// Event director.
    #[serde(default, alias = "directorId")]
    pub director_id: String,
    /// Scheduled event the program belongs to.
    #[serde(default, alias = "eventId")]
    pub event_id: Option<String>,
}

impl ServiceProgramPayload {
    /// Parse the payload out of a notice's metadata.
    pub fn from_notice(notice: &Notice) -> AppResult<Self> {
        if notice.category != NoticeCategory::ServiceProgram {
            return Err(AppError::validation(format!(
                "Notice {} is a {} notice, not a service program",
                notice.id, notice.category
            )));
        }
        serde_json::from_value(notice.metadata.clone()).map_err(|e| {
            AppError::validation(format!("Malformed service program payload: {e}"))
        })
    }

    /// Formation request for this payload. The notice id stands in for a
    /// missing event id so repeat renders of one notice stay stable.
    pub fn to_request(&self, notice: &Notice) -> FormationRequest {
        let entity_id = self
            .event_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| notice.id.to_string());
        FormationRequest::new(
            self.team.clone(),
            self.time_slot.clone(),
            self.director_id.clone(),
            entity_id,
        )
    }
}

/// Formation to render inside a service-program notice.
///
/// A malformed payload yields an empty formation, the same as an unknown team.
pub fn formation_for_notice(assigner: &FormationAssigner, notice: &Notice) -> Vec<FormationSlot> {
    match ServiceProgramPayload::from_notice(notice) {
        Ok(payload) => assigner.assign(&payload.to_request(notice)),
        Err(e) => {
            warn!(notice_id = %notice.id, error = %e, "No formation for notice");
            Vec::new()
        }
    }
}

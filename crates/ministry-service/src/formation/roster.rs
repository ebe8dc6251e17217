//! Static team roster catalog.
//!
//! Rosters are plain TOML read through the `config` crate:
//!
//! ```toml
//! [[teams]]
//! name = "Worship"
//! seats = [{ kind = "shared_role" }, { kind = "pair" }, { kind = "fixed", participant = { id = "p-1", name = "Ana" } }]
//!
//! [teams.shared_role]
//! pool = [{ id = "p-2", name = "Luis" }, { id = "p-3", name = "Marta" }]
//! fallback_time_slot = "08:00"
//! schedule = [{ time_slot = "08:00", participant_id = "p-2" }]
//!
//! [teams.pair]
//! first = { id = "p-4", name = "Sara" }
//! second = { id = "p-5", name = "Eva" }
//! ```

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::info;

use ministry_core::config::FormationConfig;
use ministry_core::error::AppError;
use ministry_core::result::AppResult;
use ministry_entity::formation::{PairMember, Participant};

/// Roster compiled into the binary, used when no roster file is configured.
const BUILTIN_ROSTER: &str = include_str!("builtin_roster.toml");

/// Accepted time-slot spellings, tried in order.
const TIME_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%H:%M:%S%.f", "%I:%M %p"];

/// Normalize a time slot to `HH:MM` (`8:00`, `08:00:00` and `8:00 AM` all become `08:00`).
///
/// Unparseable input is returned trimmed, so it can still match a roster
/// entry spelled the same way.
pub fn normalize_time_slot(raw: &str) -> String {
    let trimmed = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|| trimmed.to_string())
}

/// One seat in a team's canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeatSpec {
    /// Always the same participant.
    Fixed {
        /// Seated participant.
        participant: Participant,
        /// Whether this seat is a fixed lead.
        #[serde(default)]
        is_lead: bool,
    },
    /// The rotating lead seat drawn from the shared-role pool.
    SharedRole,
    /// The alternating-pair seat.
    Pair,
}

/// Scheduled shared-role candidate for one time slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotEntry {
    /// Time slot, any spelling [`normalize_time_slot`] accepts.
    pub time_slot: String,
    /// Pool member scheduled for the slot.
    pub participant_id: String,
}

/// Pool and schedule for a team's rotating lead seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedRole {
    /// Candidates in substitution order.
    pub pool: Vec<Participant>,
    /// Time slot → scheduled candidate.
    #[serde(default)]
    pub schedule: Vec<TimeSlotEntry>,
    /// Bucket used when the requested slot has no entry.
    #[serde(default)]
    pub fallback_time_slot: Option<String>,
}

impl SharedRole {
    /// Index in the pool of the candidate scheduled for `time_slot`.
    pub fn scheduled_index(&self, time_slot: &str) -> Option<usize> {
        let wanted = normalize_time_slot(time_slot);
        let entry = self
            .schedule
            .iter()
            .find(|e| normalize_time_slot(&e.time_slot) == wanted)?;
        self.pool.iter().position(|p| p.id == entry.participant_id)
    }

    /// Whether the schedule covers `time_slot`.
    pub fn has_slot(&self, time_slot: &str) -> bool {
        let wanted = normalize_time_slot(time_slot);
        self.schedule
            .iter()
            .any(|e| normalize_time_slot(&e.time_slot) == wanted)
    }
}

/// Two participants who never sit together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPair {
    /// Cold-start member.
    pub first: Participant,
    /// Alternate member.
    pub second: Participant,
}

impl RotationPair {
    /// The participant for a pair side.
    pub fn member(&self, side: PairMember) -> &Participant {
        match side {
            PairMember::First => &self.first,
            PairMember::Second => &self.second,
        }
    }
}

/// A team's seats plus the sections its computed seats draw from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    /// Team name, matched case-insensitively.
    pub name: String,
    /// Seats in canonical order.
    pub seats: Vec<SeatSpec>,
    /// Rotating lead seat source.
    #[serde(default)]
    pub shared_role: Option<SharedRole>,
    /// Alternating pair source.
    #[serde(default)]
    pub pair: Option<RotationPair>,
}

impl TeamRoster {
    /// Whether every seat is fixed.
    pub fn is_fixed(&self) -> bool {
        self.seats
            .iter()
            .all(|s| matches!(s, SeatSpec::Fixed { .. }))
    }

    /// Participants in fixed seats, in seat order.
    pub fn fixed_participants(&self) -> impl Iterator<Item = (&Participant, bool)> {
        self.seats.iter().filter_map(|s| match s {
            SeatSpec::Fixed {
                participant,
                is_lead,
            } => Some((participant, *is_lead)),
            _ => None,
        })
    }

    fn validate(&self) -> AppResult<()> {
        let team = &self.name;
        if team.trim().is_empty() {
            return Err(AppError::validation("Team name must not be empty"));
        }
        if self.seats.is_empty() {
            return Err(AppError::validation(format!("Team '{team}' has no seats")));
        }

        let count = |kind: fn(&SeatSpec) -> bool| self.seats.iter().filter(|s| kind(s)).count();
        let shared_seats = count(|s| matches!(s, SeatSpec::SharedRole));
        let pair_seats = count(|s| matches!(s, SeatSpec::Pair));
        if shared_seats > 1 || pair_seats > 1 {
            return Err(AppError::validation(format!(
                "Team '{team}' declares more than one shared-role or pair seat"
            )));
        }

        let mut seated = HashSet::new();
        for (participant, _) in self.fixed_participants() {
            if !seated.insert(participant.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Team '{team}' seats '{}' more than once",
                    participant.id
                )));
            }
        }

        if shared_seats == 1 {
            let role = self.shared_role.as_ref().ok_or_else(|| {
                AppError::validation(format!("Team '{team}' has a shared-role seat but no shared_role"))
            })?;
            if role.pool.is_empty() {
                return Err(AppError::validation(format!(
                    "Team '{team}' shared_role pool is empty"
                )));
            }
            for entry in &role.schedule {
                if !role.pool.iter().any(|p| p.id == entry.participant_id) {
                    return Err(AppError::validation(format!(
                        "Team '{team}' schedules '{}' at {} but they are not in the pool",
                        entry.participant_id, entry.time_slot
                    )));
                }
            }
        }

        if pair_seats == 1 {
            let pair = self.pair.as_ref().ok_or_else(|| {
                AppError::validation(format!("Team '{team}' has a pair seat but no pair"))
            })?;
            if pair.first.id == pair.second.id {
                return Err(AppError::validation(format!(
                    "Team '{team}' pair members must differ"
                )));
            }
            if seated.contains(pair.first.id.as_str()) || seated.contains(pair.second.id.as_str()) {
                return Err(AppError::validation(format!(
                    "Team '{team}' pair member also holds a fixed seat"
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RosterFile {
    #[serde(default)]
    teams: Vec<TeamRoster>,
}

/// Every configured team, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterCatalog {
    teams: Vec<TeamRoster>,
}

impl RosterCatalog {
    /// Build and validate a catalog from team rosters.
    pub fn new(teams: Vec<TeamRoster>) -> AppResult<Self> {
        let mut names = HashSet::new();
        for team in &teams {
            team.validate()?;
            if !names.insert(team.name.to_lowercase()) {
                return Err(AppError::validation(format!(
                    "Team '{}' is defined more than once",
                    team.name
                )));
            }
        }
        Ok(Self { teams })
    }

    /// The roster compiled into the binary.
    pub fn builtin() -> AppResult<Self> {
        Self::from_source(config::File::from_str(
            BUILTIN_ROSTER,
            config::FileFormat::Toml,
        ))
    }

    /// Load a roster file.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "Roster file not found: {}",
                path.display()
            )));
        }
        let catalog = Self::from_source(config::File::from(path))?;
        info!(path = %path.display(), teams = catalog.len(), "Roster loaded");
        Ok(catalog)
    }

    /// The configured roster file, or the built-in roster.
    pub fn from_config(config: &FormationConfig) -> AppResult<Self> {
        match &config.roster_path {
            Some(path) => Self::load(Path::new(path)),
            None => Self::builtin(),
        }
    }

    fn from_source<S>(source: S) -> AppResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let file: RosterFile = config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::configuration(format!("Invalid roster: {e}")))?;
        Self::new(file.teams)
    }

    /// Look up a team, ignoring case and surrounding whitespace.
    pub fn team(&self, name: &str) -> Option<&TeamRoster> {
        let name = name.trim();
        self.teams.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Whether `participant_id` holds a fixed lead seat in any team.
    pub fn is_fixed_lead(&self, participant_id: &str) -> bool {
        self.teams.iter().any(|team| {
            team.fixed_participants()
                .any(|(p, is_lead)| is_lead && p.id == participant_id)
        })
    }

    /// Team names in catalog order.
    pub fn team_names(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|t| t.name.as_str())
    }

    /// Number of teams.
    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Whether the catalog has no teams.
    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ministry_core::error::ErrorKind;

    use super::*;

    fn p(id: &str) -> Participant {
        Participant::new(id, id.to_uppercase())
    }

    fn team_with_shared_role(schedule: Vec<TimeSlotEntry>) -> TeamRoster {
        TeamRoster {
            name: "TeamX".into(),
            seats: vec![SeatSpec::SharedRole],
            shared_role: Some(SharedRole {
                pool: vec![p("a"), p("b")],
                schedule,
                fallback_time_slot: None,
            }),
            pair: None,
        }
    }

    #[test]
    fn test_normalize_time_slot() {
        assert_eq!(normalize_time_slot("8:00"), "08:00");
        assert_eq!(normalize_time_slot("08:00:00"), "08:00");
        assert_eq!(normalize_time_slot(" 08:00 "), "08:00");
        assert_eq!(normalize_time_slot("6:30 PM"), "18:30");
        assert_eq!(normalize_time_slot("evening"), "evening");
    }

    #[test]
    fn test_builtin_roster_is_valid() {
        let catalog = RosterCatalog::builtin().expect("builtin roster");
        assert!(!catalog.is_empty());
        assert!(catalog.team_names().count() >= 2);
    }

    #[test]
    fn test_team_lookup_ignores_case() {
        let catalog = RosterCatalog::new(vec![team_with_shared_role(Vec::new())]).unwrap();
        assert!(catalog.team("teamx").is_some());
        assert!(catalog.team(" TEAMX ").is_some());
        assert!(catalog.team("TeamY").is_none());
    }

    #[test]
    fn test_schedule_outside_pool_rejected() {
        let team = team_with_shared_role(vec![TimeSlotEntry {
            time_slot: "08:00".into(),
            participant_id: "zz".into(),
        }]);
        let err = RosterCatalog::new(vec![team]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[test]
    fn test_pair_seat_requires_pair() {
        let team = TeamRoster {
            name: "Choir".into(),
            seats: vec![SeatSpec::Pair],
            shared_role: None,
            pair: None,
        };
        assert!(RosterCatalog::new(vec![team]).is_err());
    }

    #[test]
    fn test_duplicate_team_rejected() {
        let teams = vec![
            team_with_shared_role(Vec::new()),
            team_with_shared_role(Vec::new()),
        ];
        assert!(RosterCatalog::new(teams).is_err());
    }

    #[test]
    fn test_scheduled_index_normalizes() {
        let role = SharedRole {
            pool: vec![p("a"), p("b")],
            schedule: vec![TimeSlotEntry {
                time_slot: "10:30".into(),
                participant_id: "b".into(),
            }],
            fallback_time_slot: None,
        };
        assert_eq!(role.scheduled_index("10:30:00"), Some(1));
        assert!(role.has_slot("10:30"));
        assert!(!role.has_slot("08:00"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
[[teams]]
name = "Ushers"
seats = [
  {{ kind = "fixed", participant = {{ id = "u1", name = "Rosa" }}, is_lead = true }},
  {{ kind = "fixed", participant = {{ id = "u2", name = "Pablo" }} }},
]
"#
        )
        .unwrap();

        let catalog = RosterCatalog::load(file.path()).expect("roster");
        let team = catalog.team("ushers").expect("team");
        assert!(team.is_fixed());
        assert!(catalog.is_fixed_lead("u1"));
        assert!(!catalog.is_fixed_lead("u2"));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = RosterCatalog::load(Path::new("/nonexistent/roster.toml")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }
}

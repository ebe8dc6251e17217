//! Roster catalog, pair rotation state, and the formation assigner.

pub mod assigner;
pub mod preview;
pub mod roster;
pub mod rotation;

pub use assigner::FormationAssigner;
pub use preview::{ServiceProgramPayload, formation_for_notice};
pub use roster::{RosterCatalog, RotationPair, SeatSpec, SharedRole, TeamRoster, TimeSlotEntry};
pub use rotation::{RotationChoice, RotationState};

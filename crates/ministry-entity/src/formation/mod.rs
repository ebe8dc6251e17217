//! Team formation domain entities.

pub mod participant;
pub mod slot;

pub use participant::{PairMember, Participant};
pub use slot::{FormationRequest, FormationSlot};

//! # ministry-service
//!
//! Formation services for the ministry client. The assigner computes who
//! sits where for a scheduled event from a static roster catalog, keeping
//! the director out of the lead seat and alternating mutually exclusive
//! pairs between events.
//!
//! Services follow constructor injection: the catalog and rotation state
//! are passed in at construction time via `Arc` references.

pub mod formation;

pub use formation::{
    FormationAssigner, RosterCatalog, RotationChoice, RotationState, ServiceProgramPayload,
};

//! # ministry-entity
//!
//! Domain models shared by the overlay engine and the formation
//! assigner. Models are plain serde types; no storage bindings live here.

pub mod formation;
pub mod notice;

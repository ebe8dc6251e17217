//! Overlay delivery: session dedup, the single-active-notice engine, its
//! change-feed and polling channels, and the toast relay.

pub mod dedup;
pub mod engine;
mod feed;
mod poller;
pub mod state;
pub mod toast;

pub use engine::OverlayDeliveryEngine;

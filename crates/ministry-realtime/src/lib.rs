//! # ministry-realtime
//!
//! Overlay delivery for the ministry client. Provides:
//!
//! - The `NoticeStore` contract with in-memory and REST adapters
//! - A session-scoped dedup table so each notice is surfaced at most once
//! - The overlay delivery engine: a single-active-notice state machine fed
//!   by direct triggers, a change-feed subscription, and a fallback poll
//! - A toast relay for the lighter, non-blocking notice class

pub mod metrics;
pub mod notification;
pub mod store;

pub use notification::dedup::SessionDedupTable;
pub use notification::engine::OverlayDeliveryEngine;
pub use notification::state::{OverlayState, SubmitOutcome};
pub use notification::toast::ToastRelay;
pub use store::{NoticeStore, NoticeSubscription, SubscriptionStatus};

//! Overlay state machine values.

use std::fmt;

use serde::Serialize;

use ministry_entity::notice::Notice;

/// What the overlay slot currently holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OverlayState {
    /// Nothing is shown.
    #[default]
    Idle,
    /// One notice is shown until dismissed.
    Active(Notice),
}

impl OverlayState {
    /// The shown notice, if any.
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            Self::Idle => None,
            Self::Active(notice) => Some(notice),
        }
    }

    /// Whether the slot is free.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Result of offering a candidate to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The candidate became the active notice.
    Accepted,
    /// Another notice is active; candidates are never queued.
    Busy,
    /// The notice was already surfaced this session.
    AlreadyShown,
    /// The category is not overlay class.
    NotOverlay,
    /// The engine was shut down.
    Unmounted,
}

impl SubmitOutcome {
    /// Whether the candidate was accepted.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Which channel produced a fetched candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryOrigin {
    /// One-shot query at start.
    Startup,
    /// Fallback poll tick.
    Poll,
}

impl fmt::Display for DeliveryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => write!(f, "startup"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

//! Notice category enumeration.

use serde::{Deserialize, Serialize};

/// Presentation class of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeClass {
    /// Blocking full-screen interstitial, owned by the overlay engine.
    Overlay,
    /// Passive toast, relayed without single-active arbitration.
    Toast,
}

/// Category of a notice, selecting the renderer that presents it.
///
/// Unknown tags coming from the store are preserved in [`NoticeCategory::Other`]
/// rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NoticeCategory {
    /// Daily scripture verse.
    ScriptureOfDay,
    /// Daily pastoral advice.
    AdviceOfDay,
    /// Program of an upcoming service, usually with a team formation.
    ServiceProgram,
    /// General announcement.
    Announcement,
    /// Announcement tied to a specific event.
    EventAnnouncement,
    /// Announcement addressed to one ministry.
    MinistryAnnouncement,
    /// Rehearsal reminder or change.
    RehearsalAlert,
    /// Urgent request (prayer, help, substitution).
    UrgentRequest,
    /// New chat message.
    ChatMessage,
    /// Schedule change summary.
    ScheduleChange,
    /// Anything else worth a toast.
    General,
    /// Tag not known to this build.
    Other(String),
}

impl NoticeCategory {
    /// All categories that render as blocking overlays.
    pub const OVERLAY: [NoticeCategory; 8] = [
        Self::ScriptureOfDay,
        Self::AdviceOfDay,
        Self::ServiceProgram,
        Self::Announcement,
        Self::EventAnnouncement,
        Self::MinistryAnnouncement,
        Self::RehearsalAlert,
        Self::UrgentRequest,
    ];

    /// Return the category as its wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ScriptureOfDay => "scripture_of_day",
            Self::AdviceOfDay => "advice_of_day",
            Self::ServiceProgram => "service_program",
            Self::Announcement => "announcement",
            Self::EventAnnouncement => "event_announcement",
            Self::MinistryAnnouncement => "ministry_announcement",
            Self::RehearsalAlert => "rehearsal_alert",
            Self::UrgentRequest => "urgent_request",
            Self::ChatMessage => "chat_message",
            Self::ScheduleChange => "schedule_change",
            Self::General => "general",
            Self::Other(tag) => tag,
        }
    }

    /// Presentation class of this category.
    pub fn class(&self) -> NoticeClass {
        if self.is_overlay() {
            NoticeClass::Overlay
        } else {
            NoticeClass::Toast
        }
    }

    /// Whether this category is presented as a blocking overlay.
    pub fn is_overlay(&self) -> bool {
        matches!(
            self,
            Self::ScriptureOfDay
                | Self::AdviceOfDay
                | Self::ServiceProgram
                | Self::Announcement
                | Self::EventAnnouncement
                | Self::MinistryAnnouncement
                | Self::RehearsalAlert
                | Self::UrgentRequest
        )
    }
}

impl From<String> for NoticeCategory {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().replace('-', "_").as_str() {
            "scripture_of_day" => Self::ScriptureOfDay,
            "advice_of_day" => Self::AdviceOfDay,
            "service_program" => Self::ServiceProgram,
            "announcement" => Self::Announcement,
            "event_announcement" => Self::EventAnnouncement,
            "ministry_announcement" => Self::MinistryAnnouncement,
            "rehearsal_alert" => Self::RehearsalAlert,
            "urgent_request" => Self::UrgentRequest,
            "chat_message" => Self::ChatMessage,
            "schedule_change" => Self::ScheduleChange,
            "general" => Self::General,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for NoticeCategory {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<NoticeCategory> for String {
    fn from(category: NoticeCategory) -> String {
        match category {
            NoticeCategory::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for NoticeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Notice priority levels.

use serde::{Deserialize, Serialize};

use super::category::NoticeCategory;

/// Named priority levels mapped onto the numeric ordinal stored with a notice.
///
/// Higher ordinals win when several unread notices compete for the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    /// Background information.
    Low,
    /// Standard notices.
    Normal,
    /// Important notices.
    High,
    /// Requires immediate attention.
    Urgent,
}

impl PriorityLevel {
    /// Parse from string, defaulting to [`PriorityLevel::Normal`].
    pub fn from_str_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            "urgent" => Self::Urgent,
            _ => Self::Normal,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }

    /// Numeric ordinal stored in the notice row.
    pub fn ordinal(&self) -> i32 {
        match self {
            Self::Low => 1,
            Self::Normal => 5,
            Self::High => 8,
            Self::Urgent => 10,
        }
    }

    /// Default level for a category when the writer gives none.
    pub fn default_for(category: &NoticeCategory) -> Self {
        match category {
            NoticeCategory::UrgentRequest => Self::Urgent,
            NoticeCategory::RehearsalAlert | NoticeCategory::ServiceProgram => Self::High,
            NoticeCategory::ScriptureOfDay | NoticeCategory::AdviceOfDay => Self::Low,
            _ => Self::Normal,
        }
    }
}

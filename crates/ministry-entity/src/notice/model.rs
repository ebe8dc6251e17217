//! Notice entity model.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ministry_core::error::AppError;
use ministry_core::types::id::{NoticeId, UserId};

use super::category::NoticeCategory;
use super::priority::PriorityLevel;

/// Wire sentinel meaning "addressed to everyone".
const BROADCAST_SENTINEL: &str = "all";

/// Addressee of a notice.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Recipient {
    /// A single user.
    User(UserId),
    /// Every user.
    Broadcast,
}

impl Recipient {
    /// Whether a notice with this recipient should reach `user`.
    pub fn includes(&self, user: &UserId) -> bool {
        match self {
            Self::User(id) => id == user,
            Self::Broadcast => true,
        }
    }
}

impl From<String> for Recipient {
    fn from(value: String) -> Self {
        if value.is_empty() || value.eq_ignore_ascii_case(BROADCAST_SENTINEL) {
            Self::Broadcast
        } else {
            Self::User(UserId::from(value))
        }
    }
}

impl From<Recipient> for String {
    fn from(recipient: Recipient) -> String {
        match recipient {
            Recipient::User(id) => id.into_inner(),
            Recipient::Broadcast => BROADCAST_SENTINEL.to_string(),
        }
    }
}

impl From<UserId> for Recipient {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

/// A single addressed, categorized message that may require full-screen presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    /// Unique notice identifier.
    pub id: NoticeId,
    /// Category selecting the renderer. Immutable once created.
    pub category: NoticeCategory,
    /// Display title.
    pub title: String,
    /// Display body.
    #[serde(default)]
    pub body: String,
    /// Category-specific payload, interpreted only by renderers.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Addressee (a user or everyone).
    #[serde(rename = "recipient_id")]
    pub recipient: Recipient,
    /// Whether the notice has been dismissed.
    #[serde(default)]
    pub is_read: bool,
    /// Ordinal used to choose among several eligible notices.
    #[serde(default)]
    pub priority: i32,
    /// Creation time, secondary sort key.
    pub created_at: DateTime<Utc>,
}

impl Notice {
    /// Build a synthetic notice for previews and other direct triggers.
    ///
    /// The id carries `prefix`, which exempts it from dedup and `mark_read`.
    pub fn preview(
        prefix: &str,
        category: NoticeCategory,
        title: impl Into<String>,
        body: impl Into<String>,
        metadata: serde_json::Value,
    ) -> Self {
        let priority = PriorityLevel::default_for(&category).ordinal();
        Self {
            id: NoticeId::new(format!("{prefix}{}", Uuid::new_v4())),
            category,
            title: title.into(),
            body: body.into(),
            metadata,
            recipient: Recipient::Broadcast,
            is_read: false,
            priority,
            created_at: Utc::now(),
        }
    }

    /// Check if the notice is still unread.
    pub fn is_unread(&self) -> bool {
        !self.is_read
    }

    /// Whether the notice is addressed to `user` (directly or by broadcast).
    pub fn is_addressed_to(&self, user: &UserId) -> bool {
        self.recipient.includes(user)
    }

    /// Whether the notice belongs to the overlay class.
    pub fn is_overlay(&self) -> bool {
        self.category.is_overlay()
    }

    /// Delivery order: higher priority first, then newest first.
    pub fn delivery_order(a: &Notice, b: &Notice) -> Ordering {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }

    /// Pick the single notice that should be delivered next.
    pub fn most_urgent(notices: Vec<Notice>) -> Option<Notice> {
        notices
            .into_iter()
            .min_by(|a, b| Self::delivery_order(a, b))
    }
}

/// A notice as submitted by a writer, before the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotice {
    /// Category selecting the renderer.
    pub category: NoticeCategory,
    /// Display title.
    pub title: String,
    /// Display body.
    #[serde(default)]
    pub body: String,
    /// Category-specific payload.
    #[serde(default)]
    pub metadata: serde_json::Value,
    /// Addressee.
    #[serde(rename = "recipient_id")]
    pub recipient: Recipient,
    /// Explicit priority; the category default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

impl NewNotice {
    /// Start a broadcast notice with an empty body.
    pub fn new(category: NoticeCategory, title: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            body: String::new(),
            metadata: serde_json::Value::Null,
            recipient: Recipient::Broadcast,
            priority: None,
        }
    }

    /// Set the body text.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the metadata payload.
    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Address the notice to a single user.
    pub fn to_user(mut self, user: UserId) -> Self {
        self.recipient = Recipient::User(user);
        self
    }

    /// Set an explicit priority ordinal.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Priority that will be stored: explicit, or the category default.
    pub fn effective_priority(&self) -> i32 {
        self.priority
            .unwrap_or_else(|| PriorityLevel::default_for(&self.category).ordinal())
    }

    /// Reject writes the presentation layer could not render.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("Notice title must not be empty"));
        }
        if let NoticeCategory::Other(tag) = &self.category {
            if tag.trim().is_empty() {
                return Err(AppError::validation("Notice category must not be empty"));
            }
        }
        Ok(())
    }

    /// Materialize the stored notice.
    pub fn into_notice(self, id: NoticeId, created_at: DateTime<Utc>) -> Notice {
        let priority = self.effective_priority();
        Notice {
            id,
            category: self.category,
            title: self.title,
            body: self.body,
            metadata: self.metadata,
            recipient: self.recipient,
            is_read: false,
            priority,
            created_at,
        }
    }
}

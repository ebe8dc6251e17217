//! Notice query filter shared by fetches and change-feed subscriptions.

use serde::{Deserialize, Serialize};

use ministry_core::types::id::UserId;

use super::category::NoticeCategory;
use super::model::Notice;

/// Selects notices addressed to one user within a set of categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeFilter {
    /// The user whose own and broadcast notices are selected.
    pub recipient: UserId,
    /// Categories to include. Empty means every category.
    #[serde(default)]
    pub categories: Vec<NoticeCategory>,
}

impl NoticeFilter {
    /// Every category, for one user.
    pub fn for_user(recipient: UserId) -> Self {
        Self {
            recipient,
            categories: Vec::new(),
        }
    }

    /// Overlay-class categories only, for one user.
    pub fn overlays_for(recipient: UserId) -> Self {
        Self {
            recipient,
            categories: NoticeCategory::OVERLAY.to_vec(),
        }
    }

    /// Whether the category passes this filter.
    pub fn accepts_category(&self, category: &NoticeCategory) -> bool {
        self.categories.is_empty() || self.categories.contains(category)
    }

    /// Whether the notice passes this filter, ignoring read state.
    pub fn matches(&self, notice: &Notice) -> bool {
        notice.is_addressed_to(&self.recipient) && self.accepts_category(&notice.category)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use ministry_core::types::id::NoticeId;

    use super::*;
    use crate::notice::model::NewNotice;

    #[test]
    fn test_overlay_filter_skips_toasts() {
        let me = UserId::new("me");
        let filter = NoticeFilter::overlays_for(me.clone());
        let chat = NewNotice::new(NoticeCategory::ChatMessage, "hi")
            .to_user(me.clone())
            .into_notice(NoticeId::new("1"), Utc::now());
        let alert = NewNotice::new(NoticeCategory::RehearsalAlert, "moved")
            .to_user(me)
            .into_notice(NoticeId::new("2"), Utc::now());
        assert!(!filter.matches(&chat));
        assert!(filter.matches(&alert));
    }

    #[test]
    fn test_filter_respects_recipient() {
        let filter = NoticeFilter::for_user(UserId::new("me"));
        let theirs = NewNotice::new(NoticeCategory::General, "x")
            .to_user(UserId::new("them"))
            .into_notice(NoticeId::new("1"), Utc::now());
        let everyone = NewNotice::new(NoticeCategory::General, "y")
            .into_notice(NoticeId::new("2"), Utc::now());
        assert!(!filter.matches(&theirs));
        assert!(filter.matches(&everyone));
    }
}

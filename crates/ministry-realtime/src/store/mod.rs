//! The remote notice store contract and its adapters.
//!
//! The store is an opaque managed service. The engine only relies on the
//! four operations of [`NoticeStore`] and tolerates every one of them
//! failing or hanging.

pub mod memory;
pub mod rest;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use ministry_core::result::AppResult;
use ministry_core::types::id::NoticeId;
use ministry_entity::notice::{NewNotice, Notice, NoticeFilter};

pub use memory::MemoryNoticeStore;
pub use rest::RestNoticeStore;

/// Connection status of a change-feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    /// Join in progress.
    Connecting,
    /// Receiving inserts.
    Subscribed,
    /// The channel reported an error.
    ChannelError,
    /// The join or a heartbeat timed out.
    TimedOut,
    /// The server closed the channel.
    Closed,
}

impl SubscriptionStatus {
    /// Whether inserts are flowing.
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Subscribed)
    }

    /// Whether the feed cannot be relied on and polling should take over.
    pub fn is_failed(self) -> bool {
        matches!(self, Self::ChannelError | Self::TimedOut | Self::Closed)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "CONNECTING",
            Self::Subscribed => "SUBSCRIBED",
            Self::ChannelError => "CHANNEL_ERROR",
            Self::TimedOut => "TIMED_OUT",
            Self::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// A live change-feed subscription.
///
/// Dropping the subscription unsubscribes it.
pub struct NoticeSubscription {
    /// Newly inserted notices matching the subscription filter.
    pub inserts: mpsc::Receiver<Notice>,
    /// Connection status reported by the feed.
    pub status: watch::Receiver<SubscriptionStatus>,
    /// Teardown hook supplied by the adapter.
    on_unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl NoticeSubscription {
    /// Assemble a subscription from its channels and a teardown hook.
    pub fn new(
        inserts: mpsc::Receiver<Notice>,
        status: watch::Receiver<SubscriptionStatus>,
        on_unsubscribe: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            inserts,
            status,
            on_unsubscribe: Some(Box::new(on_unsubscribe)),
        }
    }

    /// Current status without waiting.
    pub fn current_status(&self) -> SubscriptionStatus {
        *self.status.borrow()
    }

    /// Stop receiving inserts. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(hook) = self.on_unsubscribe.take() {
            hook();
            self.inserts.close();
        }
    }
}

impl Drop for NoticeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for NoticeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NoticeSubscription")
            .field("status", &self.current_status())
            .field("active", &self.on_unsubscribe.is_some())
            .finish()
    }
}

/// Contract of the remote notice store.
#[async_trait]
pub trait NoticeStore: Send + Sync + 'static {
    /// Fetch unread notices matching the filter, in no particular order.
    async fn fetch_unread(&self, filter: &NoticeFilter) -> AppResult<Vec<Notice>>;

    /// Subscribe to inserts matching the filter.
    async fn subscribe_inserts(&self, filter: &NoticeFilter) -> AppResult<NoticeSubscription>;

    /// Mark a notice as read.
    async fn mark_read(&self, id: &NoticeId) -> AppResult<()>;

    /// Insert a new notice and return the stored row.
    async fn insert(&self, notice: NewNotice) -> AppResult<Notice>;
}

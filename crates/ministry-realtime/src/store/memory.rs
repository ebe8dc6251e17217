//! In-memory notice store for single-process use and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};
use uuid::Uuid;

use ministry_core::error::AppError;
use ministry_core::result::AppResult;
use ministry_core::types::id::NoticeId;
use ministry_entity::notice::{NewNotice, Notice, NoticeFilter};

use super::{NoticeStore, NoticeSubscription, SubscriptionStatus};

/// Default insert buffer per subscriber.
const DEFAULT_BUFFER: usize = 64;

/// A live subscriber to the insert feed.
#[derive(Debug)]
struct Subscriber {
    filter: NoticeFilter,
    inserts: mpsc::Sender<Notice>,
    status: watch::Sender<SubscriptionStatus>,
}

/// Injected failures.
#[derive(Debug, Clone)]
struct Faults {
    fail_fetch: bool,
    fail_mark_read: bool,
    fail_subscribe: bool,
    mark_read_delay: Option<Duration>,
    connect_status: SubscriptionStatus,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            fail_fetch: false,
            fail_mark_read: false,
            fail_subscribe: false,
            mark_read_delay: None,
            connect_status: SubscriptionStatus::Subscribed,
        }
    }
}

#[derive(Debug)]
struct Inner {
    notices: Mutex<Vec<Notice>>,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
    next_subscriber: AtomicU64,
    buffer_size: usize,
    faults: Mutex<Faults>,
    fetch_calls: AtomicUsize,
    subscribe_calls: AtomicUsize,
    mark_read_calls: Mutex<Vec<NoticeId>>,
}

/// Process-local implementation of [`NoticeStore`].
///
/// Inserts are pushed to every subscriber whose filter matches. Faults can
/// be injected to exercise the engine's degraded paths.
#[derive(Debug, Clone)]
pub struct MemoryNoticeStore {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MemoryNoticeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER)
    }

    /// Create an empty store with a custom per-subscriber buffer.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                notices: Mutex::new(Vec::new()),
                subscribers: Mutex::new(HashMap::new()),
                next_subscriber: AtomicU64::new(1),
                buffer_size: buffer_size.max(1),
                faults: Mutex::new(Faults::default()),
                fetch_calls: AtomicUsize::new(0),
                subscribe_calls: AtomicUsize::new(0),
                mark_read_calls: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Add an existing row without publishing it to subscribers.
    pub fn seed(&self, notice: Notice) {
        lock(&self.inner.notices).push(notice);
    }

    /// Snapshot of every stored row.
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.inner.notices).clone()
    }

    /// Look up a stored row.
    pub fn get(&self, id: &NoticeId) -> Option<Notice> {
        lock(&self.inner.notices)
            .iter()
            .find(|n| &n.id == id)
            .cloned()
    }

    /// Number of `fetch_unread` calls so far, failed ones included.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `subscribe_inserts` calls so far.
    pub fn subscribe_count(&self) -> usize {
        self.inner.subscribe_calls.load(Ordering::SeqCst)
    }

    /// Ids passed to `mark_read`, failed calls included.
    pub fn mark_read_calls(&self) -> Vec<NoticeId> {
        lock(&self.inner.mark_read_calls).clone()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner.subscribers).len()
    }

    /// Make `fetch_unread` fail.
    pub fn set_fetch_failure(&self, fail: bool) {
        lock(&self.inner.faults).fail_fetch = fail;
    }

    /// Make `mark_read` fail.
    pub fn set_mark_read_failure(&self, fail: bool) {
        lock(&self.inner.faults).fail_mark_read = fail;
    }

    /// Make `subscribe_inserts` fail.
    pub fn set_subscribe_failure(&self, fail: bool) {
        lock(&self.inner.faults).fail_subscribe = fail;
    }

    /// Delay every `mark_read` call.
    pub fn set_mark_read_delay(&self, delay: Option<Duration>) {
        lock(&self.inner.faults).mark_read_delay = delay;
    }

    /// Status new subscriptions start in.
    pub fn set_connect_status(&self, status: SubscriptionStatus) {
        lock(&self.inner.faults).connect_status = status;
    }

    /// Push a status change to every live subscription.
    pub fn set_feed_status(&self, status: SubscriptionStatus) {
        for subscriber in lock(&self.inner.subscribers).values() {
            subscriber.status.send_replace(status);
        }
        debug!(%status, "Memory feed status changed");
    }

    fn faults(&self) -> Faults {
        lock(&self.inner.faults).clone()
    }

    fn publish(&self, notice: &Notice) {
        let mut subscribers = lock(&self.inner.subscribers);
        subscribers.retain(|id, subscriber| {
            if !subscriber.filter.matches(notice) {
                return true;
            }
            match subscriber.inserts.try_send(notice.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(
                        subscriber = id,
                        notice_id = %notice.id,
                        "Subscriber buffer full, dropping insert"
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            }
        });
    }
}

impl Default for MemoryNoticeStore {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_subscriber(inner: &Weak<Inner>, id: u64) {
    if let Some(inner) = inner.upgrade() {
        lock(&inner.subscribers).remove(&id);
        debug!(subscriber = id, "Memory feed subscriber removed");
    }
}

#[async_trait]
impl NoticeStore for MemoryNoticeStore {
    async fn fetch_unread(&self, filter: &NoticeFilter) -> AppResult<Vec<Notice>> {
        self.inner.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults().fail_fetch {
            return Err(AppError::service_unavailable("notice store unreachable"));
        }

        Ok(lock(&self.inner.notices)
            .iter()
            .filter(|n| n.is_unread() && filter.matches(n))
            .cloned()
            .collect())
    }

    async fn subscribe_inserts(&self, filter: &NoticeFilter) -> AppResult<NoticeSubscription> {
        self.inner.subscribe_calls.fetch_add(1, Ordering::SeqCst);
        let faults = self.faults();
        if faults.fail_subscribe {
            return Err(AppError::service_unavailable("change feed unreachable"));
        }

        let id = self.inner.next_subscriber.fetch_add(1, Ordering::SeqCst);
        let (insert_tx, insert_rx) = mpsc::channel(self.inner.buffer_size);
        let (status_tx, status_rx) = watch::channel(faults.connect_status);

        lock(&self.inner.subscribers).insert(
            id,
            Subscriber {
                filter: filter.clone(),
                inserts: insert_tx,
                status: status_tx,
            },
        );
        debug!(subscriber = id, recipient = %filter.recipient, "Memory feed subscriber added");

        let weak = Arc::downgrade(&self.inner);
        Ok(NoticeSubscription::new(insert_rx, status_rx, move || {
            remove_subscriber(&weak, id)
        }))
    }

    async fn mark_read(&self, id: &NoticeId) -> AppResult<()> {
        lock(&self.inner.mark_read_calls).push(id.clone());
        let faults = self.faults();
        if let Some(delay) = faults.mark_read_delay {
            tokio::time::sleep(delay).await;
        }
        if faults.fail_mark_read {
            return Err(AppError::external_service(format!(
                "mark_read rejected for {id}"
            )));
        }

        let mut notices = lock(&self.inner.notices);
        match notices.iter_mut().find(|n| &n.id == id) {
            Some(notice) => {
                notice.is_read = true;
                Ok(())
            }
            None => Err(AppError::not_found(format!("Notice {id} not found"))),
        }
    }

    async fn insert(&self, notice: NewNotice) -> AppResult<Notice> {
        notice.validate()?;
        let stored = notice.into_notice(NoticeId::new(Uuid::new_v4().to_string()), Utc::now());
        lock(&self.inner.notices).push(stored.clone());
        self.publish(&stored);
        Ok(stored)
    }
}

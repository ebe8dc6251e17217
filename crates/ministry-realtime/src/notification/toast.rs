//! Relay for toast-class notices.
//!
//! Toasts never compete for the overlay slot. They are fanned out to
//! listeners, with bursts of identical toasts collapsed inside a short
//! window.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::trace;

use ministry_entity::notice::{Notice, NoticeCategory};

/// Toast fan-out capacity per listener.
const TOAST_CAPACITY: usize = 32;

/// What makes two toasts the same burst.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ToastKey {
    category: NoticeCategory,
    title: String,
    body: String,
}

impl From<&Notice> for ToastKey {
    fn from(notice: &Notice) -> Self {
        Self {
            category: notice.category.clone(),
            title: notice.title.clone(),
            body: notice.body.clone(),
        }
    }
}

/// Last relay time per toast key. Only keys still inside the window are kept.
#[derive(Debug)]
struct BurstFilter {
    window: Duration,
    recent: Mutex<HashMap<ToastKey, Instant>>,
}

impl BurstFilter {
    fn new(window: Duration) -> Self {
        Self {
            window,
            recent: Mutex::new(HashMap::new()),
        }
    }

    /// Record `key` and report whether it starts a new burst.
    fn admit(&self, key: ToastKey) -> bool {
        let now = Instant::now();
        let mut recent = self.recent.lock().unwrap_or_else(|e| e.into_inner());
        recent.retain(|_, relayed_at| now.duration_since(*relayed_at) < self.window);
        if recent.contains_key(&key) {
            return false;
        }
        recent.insert(key, now);
        true
    }
}

/// Fans toast notices out to listeners.
#[derive(Debug)]
pub struct ToastRelay {
    sender: broadcast::Sender<Notice>,
    bursts: BurstFilter,
}

impl ToastRelay {
    /// Create a relay collapsing repeats within `window_ms`.
    pub fn new(window_ms: u64) -> Self {
        let (sender, _) = broadcast::channel(TOAST_CAPACITY);
        Self {
            sender,
            bursts: BurstFilter::new(Duration::from_millis(window_ms)),
        }
    }

    /// Listen for toasts.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Forward a toast. Returns `false` when collapsed as a repeat.
    pub fn relay(&self, notice: Notice) -> bool {
        if !self.bursts.admit(ToastKey::from(&notice)) {
            trace!(notice_id = %notice.id, "Toast collapsed as repeat");
            return false;
        }
        // No listener is fine: toasts are best effort.
        let _ = self.sender.send(notice);
        true
    }
}

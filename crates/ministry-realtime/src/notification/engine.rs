//! The overlay delivery engine.
//!
//! Holds the single "currently shown" slot and arbitrates between three
//! channels that all funnel into [`OverlayDeliveryEngine::submit`]:
//!
//! 1. direct triggers (previews, tests), synchronous;
//! 2. the change-feed subscription, pushed as rows are inserted;
//! 3. a fallback poll that runs only while the feed is unhealthy.
//!
//! The first eligible candidate while idle wins. Nothing preempts an
//! active notice and nothing is queued behind it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use ministry_core::config::OverlayConfig;
use ministry_core::types::id::{NoticeId, UserId};
use ministry_entity::notice::{Notice, NoticeCategory, NoticeClass, NoticeFilter};

use crate::metrics::{MetricsSnapshot, OverlayMetrics};
use crate::store::NoticeStore;

use super::dedup::SessionDedupTable;
use super::feed;
use super::state::{DeliveryOrigin, OverlayState, SubmitOutcome};
use super::toast::ToastRelay;

/// Background channels bound to one resolved identity.
#[derive(Debug)]
struct DeliveryChannels {
    identity: UserId,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Drop for DeliveryChannels {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Single source of truth for the interstitial currently shown.
pub struct OverlayDeliveryEngine {
    /// Remote notice store.
    store: Arc<dyn NoticeStore>,
    /// Session dedup table.
    dedup: Arc<SessionDedupTable>,
    /// Toast fan-out.
    toasts: ToastRelay,
    /// Engine settings.
    config: OverlayConfig,
    /// Idle/Active slot.
    state: Mutex<OverlayState>,
    /// Observable copy of the active notice.
    active_tx: watch::Sender<Option<Notice>>,
    /// Cleared on shutdown; guards every late completion.
    mounted: AtomicBool,
    /// Feed listener and startup fetch for the current identity.
    channels: Mutex<Option<DeliveryChannels>>,
    /// Counters.
    metrics: OverlayMetrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl std::fmt::Debug for OverlayDeliveryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayDeliveryEngine")
            .field("state", &*lock(&self.state))
            .field("mounted", &self.is_mounted())
            .field("dedup_entries", &self.dedup.len())
            .finish_non_exhaustive()
    }
}

impl OverlayDeliveryEngine {
    /// Create an idle, mounted engine. No channel runs until [`start`](Self::start).
    pub fn new(
        store: Arc<dyn NoticeStore>,
        dedup: Arc<SessionDedupTable>,
        config: OverlayConfig,
    ) -> Arc<Self> {
        let (active_tx, _) = watch::channel(None);
        Arc::new(Self {
            store,
            dedup,
            toasts: ToastRelay::new(config.toast_window_ms),
            config,
            state: Mutex::new(OverlayState::Idle),
            active_tx,
            mounted: AtomicBool::new(true),
            channels: Mutex::new(None),
            metrics: OverlayMetrics::new(),
        })
    }

    /// The currently shown notice.
    pub fn active_notice(&self) -> Option<Notice> {
        lock(&self.state).notice().cloned()
    }

    /// Snapshot of the state machine.
    pub fn state(&self) -> OverlayState {
        lock(&self.state).clone()
    }

    /// Observe the active notice. The receiver sees `None` when idle.
    pub fn subscribe(&self) -> watch::Receiver<Option<Notice>> {
        self.active_tx.subscribe()
    }

    /// Listen for toast-class notices arriving on the change feed.
    pub fn toasts(&self) -> tokio::sync::broadcast::Receiver<Notice> {
        self.toasts.subscribe()
    }

    /// Whether the engine has not been shut down.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Engine settings.
    pub fn config(&self) -> &OverlayConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> Arc<dyn NoticeStore> {
        Arc::clone(&self.store)
    }

    pub(crate) fn record_poll_started(&self) {
        OverlayMetrics::inc(&self.metrics.polls_started);
    }

    /// Whether the id belongs to a synthetic notice (preview, test).
    pub fn is_synthetic(&self, id: &NoticeId) -> bool {
        id.has_prefix(&self.config.preview_id_prefix)
    }

    /// Offer a candidate for the overlay slot.
    ///
    /// Accepted only if it is overlay class, not yet shown this session
    /// (synthetic ids are exempt) and nothing else is active.
    pub fn submit(&self, candidate: Notice) -> SubmitOutcome {
        let outcome = self.try_activate(candidate);
        self.metrics.record_submit(outcome);
        outcome
    }

    fn try_activate(&self, candidate: Notice) -> SubmitOutcome {
        if !self.is_mounted() {
            debug!(notice_id = %candidate.id, "Submit after shutdown ignored");
            return SubmitOutcome::Unmounted;
        }
        if candidate.category.class() != NoticeClass::Overlay {
            trace!(notice_id = %candidate.id, category = %candidate.category, "Not an overlay notice");
            return SubmitOutcome::NotOverlay;
        }

        let synthetic = self.is_synthetic(&candidate.id);
        let mut state = lock(&self.state);

        if !synthetic && self.dedup.was_shown(&candidate.id) {
            trace!(notice_id = %candidate.id, "Notice already shown this session");
            return SubmitOutcome::AlreadyShown;
        }
        if let OverlayState::Active(current) = &*state {
            debug!(
                active = %current.id,
                rejected = %candidate.id,
                "Overlay busy, candidate dropped"
            );
            return SubmitOutcome::Busy;
        }

        if !synthetic {
            self.dedup.mark_shown(&candidate.id);
        }
        info!(
            notice_id = %candidate.id,
            category = %candidate.category,
            priority = candidate.priority,
            "Overlay notice activated"
        );
        *state = OverlayState::Active(candidate.clone());
        self.active_tx.send_replace(Some(candidate));
        SubmitOutcome::Accepted
    }

    /// Show a synthetic notice built on the spot.
    pub fn preview(
        &self,
        category: NoticeCategory,
        title: impl Into<String>,
        body: impl Into<String>,
        metadata: serde_json::Value,
    ) -> SubmitOutcome {
        let notice = Notice::preview(
            &self.config.preview_id_prefix,
            category,
            title,
            body,
            metadata,
        );
        self.submit(notice)
    }

    /// Dismiss the active notice.
    ///
    /// The slot returns to idle before the store is told, so a failing or
    /// hanging `mark_read` can only delay this call, never keep the overlay
    /// up. Returns the dismissed notice; dismissing while idle is a no-op.
    pub async fn dismiss(&self) -> Option<Notice> {
        let notice = {
            let mut state = lock(&self.state);
            match std::mem::take(&mut *state) {
                OverlayState::Idle => {
                    debug!("Dismiss while idle ignored");
                    return None;
                }
                OverlayState::Active(notice) => {
                    self.active_tx.send_replace(None);
                    notice
                }
            }
        };
        OverlayMetrics::inc(&self.metrics.dismissed);
        info!(notice_id = %notice.id, "Overlay notice dismissed");

        if self.is_synthetic(&notice.id) {
            return Some(notice);
        }
        if let Err(e) = self.store.mark_read(&notice.id).await {
            OverlayMetrics::inc(&self.metrics.mark_read_failures);
            warn!(notice_id = %notice.id, error = %e, "Failed to mark notice read");
        }
        Some(notice)
    }

    /// Start the startup fetch and change-feed listener for `identity`.
    ///
    /// Calling again with the same identity is a no-op; a different identity
    /// replaces the channels of the previous one. Must run inside a Tokio
    /// runtime.
    pub fn start(self: &Arc<Self>, identity: UserId) {
        if !self.is_mounted() {
            warn!(user = %identity, "Start after shutdown ignored");
            return;
        }

        let mut channels = lock(&self.channels);
        if let Some(existing) = channels.as_ref() {
            if existing.identity == identity {
                debug!(user = %identity, "Delivery channels already running");
                return;
            }
            info!(from = %existing.identity, to = %identity, "Identity changed, restarting delivery channels");
        }
        // Dropping the previous channels cancels them.
        channels.take();

        let cancel = CancellationToken::new();
        let startup = {
            let engine = Arc::downgrade(self);
            let identity = identity.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let Some(engine) = engine.upgrade() else {
                    return;
                };
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = engine.deliver_most_urgent(&identity, DeliveryOrigin::Startup) => {}
                }
            })
        };
        let listener = tokio::spawn(feed::run_change_feed(
            Arc::downgrade(self),
            identity.clone(),
            cancel.clone(),
        ));

        info!(user = %identity, "Overlay delivery channels started");
        *channels = Some(DeliveryChannels {
            identity,
            cancel,
            tasks: vec![startup, listener],
        });
    }

    /// Stop every channel and reject all later submissions.
    ///
    /// Waits for the listener to unsubscribe from the change feed.
    pub async fn shutdown(&self) {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        let channels = lock(&self.channels).take();
        if let Some(mut channels) = channels {
            channels.cancel.cancel();
            for task in channels.tasks.drain(..) {
                if let Err(e) = task.await {
                    warn!(error = %e, "Delivery task ended abnormally");
                }
            }
        }
        info!("Overlay delivery engine shut down");
    }

    /// Fetch unread overlay notices and submit the most urgent one not yet
    /// shown this session.
    pub(crate) async fn deliver_most_urgent(&self, identity: &UserId, origin: DeliveryOrigin) {
        let filter = NoticeFilter::overlays_for(identity.clone());
        OverlayMetrics::inc(&self.metrics.fetches);

        let notices = match self.store.fetch_unread(&filter).await {
            Ok(notices) => notices,
            Err(e) => {
                OverlayMetrics::inc(&self.metrics.fetch_failures);
                warn!(%origin, error = %e, "Failed to fetch unread notices");
                return;
            }
        };
        if !self.is_mounted() {
            debug!(%origin, "Discarding fetch completed after shutdown");
            return;
        }

        let eligible: Vec<Notice> = notices
            .into_iter()
            .filter(|n| n.is_unread() && filter.matches(n))
            .filter(|n| self.is_synthetic(&n.id) || !self.dedup.was_shown(&n.id))
            .collect();
        let count = eligible.len();
        match Notice::most_urgent(eligible) {
            Some(top) => {
                let id = top.id.clone();
                let outcome = self.submit(top);
                debug!(%origin, notice_id = %id, unread = count, ?outcome, "Most urgent notice offered");
            }
            None => trace!(%origin, "No unseen overlay notices"),
        }
    }

    /// Route a notice pushed by the change feed.
    pub(crate) fn handle_feed_insert(&self, identity: &UserId, notice: Notice) {
        if !notice.is_addressed_to(identity) || notice.is_read {
            trace!(notice_id = %notice.id, "Feed insert not deliverable to this user");
            return;
        }
        match notice.category.class() {
            NoticeClass::Overlay => {
                let id = notice.id.clone();
                let outcome = self.submit(notice);
                debug!(notice_id = %id, ?outcome, "Feed insert offered");
            }
            NoticeClass::Toast => {
                if self.is_mounted() && self.toasts.relay(notice) {
                    OverlayMetrics::inc(&self.metrics.toasts_relayed);
                }
            }
        }
    }
}

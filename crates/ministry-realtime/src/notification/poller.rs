//! Fallback poll that stands in for an unhealthy change feed.

use std::sync::Weak;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use ministry_core::types::id::UserId;

use crate::store::SubscriptionStatus;

use super::engine::OverlayDeliveryEngine;
use super::state::DeliveryOrigin;

/// Owns at most one running poll loop for one identity.
///
/// The loop runs while the feed reports a failed status and stops as soon
/// as the feed is healthy again, so the two never run side by side.
#[derive(Debug)]
pub(crate) struct FallbackPoller {
    engine: Weak<OverlayDeliveryEngine>,
    identity: UserId,
    parent: CancellationToken,
    running: Option<(CancellationToken, JoinHandle<()>)>,
}

impl FallbackPoller {
    pub(crate) fn new(
        engine: Weak<OverlayDeliveryEngine>,
        identity: UserId,
        parent: CancellationToken,
    ) -> Self {
        Self {
            engine,
            identity,
            parent,
            running: None,
        }
    }

    /// React to a feed status change.
    pub(crate) fn apply(&mut self, status: SubscriptionStatus) {
        if status.is_failed() {
            self.activate(status);
        } else if status.is_healthy() {
            self.deactivate();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start polling if not already polling.
    pub(crate) fn activate(&mut self, reason: SubscriptionStatus) {
        if self.running.is_some() || self.parent.is_cancelled() {
            return;
        }
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        let interval = engine.config().poll_interval();
        engine.record_poll_started();
        info!(
            user = %self.identity,
            %reason,
            interval_secs = interval.as_secs(),
            "Change feed unhealthy, starting fallback poll"
        );

        let token = self.parent.child_token();
        let handle = tokio::spawn(run_poll_loop(
            self.engine.clone(),
            self.identity.clone(),
            interval,
            token.clone(),
        ));
        self.running = Some((token, handle));
    }

    /// Stop polling. Returns once the loop has exited.
    pub(crate) async fn deactivate_and_wait(&mut self) {
        if let Some((token, handle)) = self.running.take() {
            token.cancel();
            let _ = handle.await;
            debug!(user = %self.identity, "Fallback poll stopped");
        }
    }

    /// Stop polling without waiting for the loop to exit.
    pub(crate) fn deactivate(&mut self) {
        if let Some((token, _)) = self.running.take() {
            token.cancel();
            info!(user = %self.identity, "Change feed healthy, fallback poll stopped");
        }
    }
}

impl Drop for FallbackPoller {
    fn drop(&mut self) {
        if let Some((token, _)) = self.running.take() {
            token.cancel();
        }
    }
}

/// Fetch and offer the most urgent notice on every tick until cancelled.
///
/// The first tick fires immediately.
async fn run_poll_loop(
    engine: Weak<OverlayDeliveryEngine>,
    identity: UserId,
    period: std::time::Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }

        let Some(engine) = engine.upgrade() else {
            break;
        };
        if !engine.is_mounted() {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = engine.deliver_most_urgent(&identity, DeliveryOrigin::Poll) => {}
        }
    }
}

//! Change-feed listener for one resolved identity.

use std::sync::Weak;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ministry_core::types::id::UserId;
use ministry_entity::notice::NoticeFilter;

use crate::store::SubscriptionStatus;

use super::engine::OverlayDeliveryEngine;
use super::poller::FallbackPoller;

/// Subscribe to inserts for `identity` and route them into the engine until
/// cancelled. Feed failures hand over to the fallback poll.
pub(crate) async fn run_change_feed(
    engine: Weak<OverlayDeliveryEngine>,
    identity: UserId,
    cancel: CancellationToken,
) {
    let mut poller = FallbackPoller::new(engine.clone(), identity.clone(), cancel.clone());

    let Some(store) = engine.upgrade().map(|e| e.store()) else {
        return;
    };
    let feed_filter = NoticeFilter::for_user(identity.clone());
    let subscribed = tokio::select! {
        _ = cancel.cancelled() => return,
        result = store.subscribe_inserts(&feed_filter) => result,
    };
    drop(store);

    let mut subscription = match subscribed {
        Ok(subscription) => subscription,
        Err(e) => {
            warn!(user = %identity, error = %e, "Change feed subscription failed");
            poller.activate(SubscriptionStatus::ChannelError);
            cancel.cancelled().await;
            poller.deactivate_and_wait().await;
            return;
        }
    };

    let initial = subscription.current_status();
    debug!(user = %identity, status = %initial, "Change feed subscribed");
    poller.apply(initial);

    let mut inserts_open = true;
    let mut status_open = true;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = subscription.inserts.recv(), if inserts_open => {
                match received {
                    Some(notice) => {
                        let Some(engine) = engine.upgrade() else { break };
                        if !engine.is_mounted() {
                            break;
                        }
                        engine.handle_feed_insert(&identity, notice);
                    }
                    None => {
                        inserts_open = false;
                        warn!(user = %identity, "Change feed closed by the store");
                        poller.activate(SubscriptionStatus::Closed);
                    }
                }
            }
            changed = subscription.status.changed(), if status_open => {
                match changed {
                    Ok(()) => {
                        let status = *subscription.status.borrow_and_update();
                        info!(user = %identity, %status, "Change feed status changed");
                        poller.apply(status);
                    }
                    Err(_) => status_open = false,
                }
            }
        }

        if !inserts_open && !status_open {
            cancel.cancelled().await;
            break;
        }
    }

    subscription.unsubscribe();
    let was_polling = poller.is_running();
    poller.deactivate_and_wait().await;
    debug!(user = %identity, was_polling, "Change feed listener stopped");
}

//! Integration tests for overlay delivery across all three channels.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use ministry_core::types::id::{NoticeId, UserId};
use ministry_entity::notice::{NewNotice, NoticeCategory};
use ministry_realtime::store::MemoryNoticeStore;
use ministry_realtime::{NoticeStore, SessionDedupTable, SubmitOutcome, SubscriptionStatus};

use helpers::{TestHarness, USER, notice, notice_at, settle};

#[tokio::test(start_paused = true)]
async fn test_startup_shows_highest_priority_first() {
    let store = MemoryNoticeStore::new();
    store.seed(notice("a", 5));
    store.seed(notice("b", 9));
    let harness = TestHarness::with_store(store);

    harness.start().await;
    assert_eq!(harness.active_id().as_deref(), Some("b"));

    // "a" is never shown while "b" is up.
    harness
        .engine
        .submit(harness.store.get(&NoticeId::new("a")).unwrap());
    assert_eq!(harness.active_id().as_deref(), Some("b"));

    harness.engine.dismiss().await;
    assert!(harness.store.get(&NoticeId::new("b")).unwrap().is_read);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_startup_shows_only_one_notice() {
    let store = MemoryNoticeStore::new();
    let now = Utc::now();
    for (i, minutes) in [30, 20, 10].into_iter().enumerate() {
        store.seed(notice_at(
            &format!("n-{i}"),
            NoticeCategory::EventAnnouncement,
            5,
            now - chrono::Duration::minutes(minutes),
        ));
    }
    let harness = TestHarness::with_store(store);

    harness.start().await;
    assert_eq!(harness.active_id().as_deref(), Some("n-2"));

    harness.engine.dismiss().await;
    settle().await;
    assert!(harness.engine.active_notice().is_none());
    assert_eq!(harness.engine.metrics().accepted, 1);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_channel_error_triggers_fetch_within_one_interval() {
    let harness = TestHarness::new();
    harness.start().await;
    let before = harness.store.fetch_count();

    harness.store.set_feed_status(SubscriptionStatus::ChannelError);
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(harness.store.fetch_count() > before);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_poll_delivers_missed_notice_and_stops_when_healthy() {
    let store = MemoryNoticeStore::new();
    store.set_connect_status(SubscriptionStatus::TimedOut);
    let harness = TestHarness::with_store(store);
    harness.start().await;

    // Rows written while the feed is down are never pushed.
    harness.store.seed(notice("late", 8));
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(harness.active_id().as_deref(), Some("late"));

    harness.store.set_feed_status(SubscriptionStatus::Subscribed);
    settle().await;
    let fetches = harness.store.fetch_count();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(harness.store.fetch_count(), fetches);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_failure_falls_back_to_polling() {
    let store = MemoryNoticeStore::new();
    store.set_subscribe_failure(true);
    let harness = TestHarness::with_store(store);
    harness.start().await;

    tokio::time::sleep(Duration::from_secs(61)).await;

    // Startup fetch plus the immediate poll and two interval ticks.
    assert_eq!(harness.store.fetch_count(), 4);
    assert_eq!(harness.engine.metrics().polls_started, 1);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_fetch_failures_never_surface() {
    let store = MemoryNoticeStore::new();
    store.set_fetch_failure(true);
    store.set_connect_status(SubscriptionStatus::ChannelError);
    let harness = TestHarness::with_store(store);
    harness.start().await;

    tokio::time::sleep(Duration::from_secs(90)).await;

    assert!(harness.engine.state().is_idle());
    assert!(harness.engine.metrics().fetch_failures >= 3);
    assert!(harness.engine.is_mounted());
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_feed_push_for_other_users_ignored() {
    let harness = TestHarness::new();
    harness.start().await;

    harness
        .store
        .insert(NewNotice::new(NoticeCategory::UrgentRequest, "Not for you").to_user(UserId::new("x")))
        .await
        .unwrap();
    settle().await;
    assert!(harness.engine.active_notice().is_none());

    harness
        .store
        .insert(NewNotice::new(NoticeCategory::UrgentRequest, "Everyone"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(harness.engine.active_notice().unwrap().title, "Everyone");
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_push_while_active_is_dropped_not_queued() {
    let harness = TestHarness::new();
    harness.start().await;
    assert_eq!(harness.engine.submit(notice("first", 1)), SubmitOutcome::Accepted);

    harness
        .store
        .insert(NewNotice::new(NoticeCategory::UrgentRequest, "Urgent").to_user(UserId::new(USER)))
        .await
        .unwrap();
    settle().await;
    assert_eq!(harness.active_id().as_deref(), Some("first"));

    harness.engine.dismiss().await;
    settle().await;
    assert!(harness.engine.active_notice().is_none());
    assert_eq!(harness.engine.metrics().rejected_busy, 1);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_dedup_survives_reload_within_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = MemoryNoticeStore::new();
    store.set_mark_read_failure(true);
    store.seed(notice("sticky", 9));

    let first = TestHarness::with_parts(store.clone(), Arc::new(SessionDedupTable::open(&path)));
    first.start().await;
    assert_eq!(first.active_id().as_deref(), Some("sticky"));
    first.engine.dismiss().await;
    first.engine.shutdown().await;

    // mark_read failed, so the row is still unread remotely.
    assert!(!store.get(&NoticeId::new("sticky")).unwrap().is_read);

    let reloaded = TestHarness::with_parts(store, Arc::new(SessionDedupTable::open(&path)));
    reloaded.start().await;
    assert!(reloaded.engine.active_notice().is_none());
    reloaded.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_seen_unread_notice_does_not_hide_unseen_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let store = MemoryNoticeStore::new();
    store.set_mark_read_failure(true);
    store.seed(notice("seen", 9));

    let first = TestHarness::with_parts(store.clone(), Arc::new(SessionDedupTable::open(&path)));
    first.start().await;
    assert_eq!(first.active_id().as_deref(), Some("seen"));
    first.engine.dismiss().await;
    first.engine.shutdown().await;

    store.seed(notice("unseen", 5));
    let reloaded = TestHarness::with_parts(store, Arc::new(SessionDedupTable::open(&path)));
    reloaded.start().await;
    assert_eq!(reloaded.active_id().as_deref(), Some("unseen"));
    reloaded.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_preview_never_marks_read_or_dedups() {
    let harness = TestHarness::new();
    harness.start().await;

    for _ in 0..2 {
        let outcome = harness.engine.preview(
            NoticeCategory::ServiceProgram,
            "Preview",
            "",
            serde_json::json!({"team": "TeamX", "time_slot": "08:00"}),
        );
        assert!(outcome.is_accepted());
        harness.engine.dismiss().await;
    }

    assert!(harness.store.mark_read_calls().is_empty());
    assert!(harness.dedup.is_empty());
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_unsubscribes_and_stops_polling() {
    let store = MemoryNoticeStore::new();
    store.set_connect_status(SubscriptionStatus::ChannelError);
    let harness = TestHarness::with_store(store);
    harness.start().await;
    assert_eq!(harness.store.subscriber_count(), 1);

    harness.engine.shutdown().await;
    let fetches = harness.store.fetch_count();
    tokio::time::sleep(Duration::from_secs(300)).await;

    assert_eq!(harness.store.subscriber_count(), 0);
    assert_eq!(harness.store.fetch_count(), fetches);
    assert_eq!(
        harness.engine.submit(notice("late", 9)),
        SubmitOutcome::Unmounted
    );
}

#[tokio::test(start_paused = true)]
async fn test_toasts_relayed_without_touching_overlay() {
    let harness = TestHarness::new();
    let mut toasts = harness.engine.toasts();
    harness.start().await;

    for _ in 0..3 {
        harness
            .store
            .insert(NewNotice::new(NoticeCategory::ChatMessage, "New message").to_user(UserId::new(USER)))
            .await
            .unwrap();
    }
    settle().await;

    assert_eq!(toasts.recv().await.unwrap().title, "New message");
    assert!(toasts.try_recv().is_err());
    assert!(harness.engine.active_notice().is_none());
    assert_eq!(harness.engine.metrics().toasts_relayed, 1);
    harness.engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_mark_read_does_not_block_next_notice() {
    let store = MemoryNoticeStore::new();
    store.set_mark_read_delay(Some(Duration::from_secs(600)));
    let harness = TestHarness::with_store(store);
    harness.engine.submit(notice("a", 5));

    let engine = Arc::clone(&harness.engine);
    let dismiss = tokio::spawn(async move { engine.dismiss().await });
    settle().await;

    assert!(harness.engine.submit(notice("b", 5)).is_accepted());
    assert_eq!(dismiss.await.unwrap().map(|n| n.id.into_inner()).as_deref(), Some("a"));
    assert_eq!(
        harness.store.mark_read_calls(),
        vec![NoticeId::new("a")]
    );
}

#[tokio::test]
async fn test_store_trait_object_roundtrip() {
    let store: Arc<dyn NoticeStore> = Arc::new(MemoryNoticeStore::new());
    let stored = store
        .insert(NewNotice::new(NoticeCategory::RehearsalAlert, "Soundcheck at 7"))
        .await
        .unwrap();
    assert_eq!(stored.priority, 8);
}

//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use ministry_core::config::{FormationConfig, OverlayConfig};
use ministry_core::types::id::{NoticeId, UserId};
use ministry_entity::formation::Participant;
use ministry_entity::notice::{NewNotice, Notice, NoticeCategory};
use ministry_realtime::store::MemoryNoticeStore;
use ministry_realtime::{OverlayDeliveryEngine, SessionDedupTable};
use ministry_service::formation::{RotationPair, SeatSpec, SharedRole, TeamRoster, TimeSlotEntry};
use ministry_service::{FormationAssigner, RosterCatalog, RotationState};

/// Identity every harness runs as.
pub const USER: &str = "member-1";

/// Engine wired to an in-memory store.
pub struct TestHarness {
    /// Fault-injectable store
    pub store: MemoryNoticeStore,
    /// Dedup table shared with the engine
    pub dedup: Arc<SessionDedupTable>,
    /// Engine under test
    pub engine: Arc<OverlayDeliveryEngine>,
}

impl TestHarness {
    /// Harness with default settings and an in-memory dedup table.
    pub fn new() -> Self {
        Self::with_store(MemoryNoticeStore::new())
    }

    /// Harness around a prepared store.
    pub fn with_store(store: MemoryNoticeStore) -> Self {
        Self::with_parts(store, Arc::new(SessionDedupTable::in_memory()))
    }

    /// Harness around a prepared store and dedup table.
    pub fn with_parts(store: MemoryNoticeStore, dedup: Arc<SessionDedupTable>) -> Self {
        let engine = OverlayDeliveryEngine::new(
            Arc::new(store.clone()),
            Arc::clone(&dedup),
            OverlayConfig::default(),
        );
        Self {
            store,
            dedup,
            engine,
        }
    }

    /// The harness user.
    pub fn user(&self) -> UserId {
        UserId::new(USER)
    }

    /// Start the engine's channels for the harness user and let them settle.
    pub async fn start(&self) {
        self.engine.start(self.user());
        settle().await;
    }

    /// Id of the active notice.
    pub fn active_id(&self) -> Option<String> {
        self.engine.active_notice().map(|n| n.id.into_inner())
    }
}

/// Let spawned tasks run.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(5)).await;
}

/// Unread overlay notice addressed to the harness user.
pub fn notice(id: &str, priority: i32) -> Notice {
    notice_at(id, NoticeCategory::Announcement, priority, Utc::now())
}

/// Unread notice with explicit category and creation time.
pub fn notice_at(
    id: &str,
    category: NoticeCategory,
    priority: i32,
    created_at: DateTime<Utc>,
) -> Notice {
    NewNotice::new(category, format!("Notice {id}"))
        .to_user(UserId::new(USER))
        .priority(priority)
        .into_notice(NoticeId::new(id), created_at)
}

/// Roster with one rotating team `TeamX` and one fixed team `Choir`.
pub fn test_catalog() -> RosterCatalog {
    let p = |id: &str, name: &str| Participant::new(id, name);
    let team_x = TeamRoster {
        name: "TeamX".into(),
        seats: vec![
            SeatSpec::SharedRole,
            SeatSpec::Pair,
            SeatSpec::Fixed {
                participant: p("keys", "Daniel"),
                is_lead: false,
            },
        ],
        shared_role: Some(SharedRole {
            pool: vec![p("L1", "Ruth"), p("L2", "Esteban"), p("L3", "Miriam")],
            schedule: vec![
                TimeSlotEntry {
                    time_slot: "08:00".into(),
                    participant_id: "L1".into(),
                },
                TimeSlotEntry {
                    time_slot: "18:00".into(),
                    participant_id: "L3".into(),
                },
            ],
            fallback_time_slot: Some("08:00".into()),
        }),
        pair: Some(RotationPair {
            first: p("P1", "Lidia"),
            second: p("P2", "Noemi"),
        }),
    };
    let choir = TeamRoster {
        name: "Choir".into(),
        seats: vec![
            SeatSpec::Fixed {
                participant: p("L2", "Esteban"),
                is_lead: true,
            },
            SeatSpec::Fixed {
                participant: p("alto", "Debora"),
                is_lead: false,
            },
        ],
        shared_role: None,
        pair: None,
    };
    RosterCatalog::new(vec![team_x, choir]).expect("valid test roster")
}

/// Assigner over [`test_catalog`] with fresh rotation state.
pub fn test_assigner() -> FormationAssigner {
    FormationAssigner::new(
        Arc::new(test_catalog()),
        Arc::new(RotationState::new()),
        &FormationConfig::default(),
    )
}

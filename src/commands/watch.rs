//! Interactive overlay watcher.
//!
//! Runs the delivery engine for one user and stands in for the
//! presentation layer: every activated notice is printed, a blank line
//! dismisses it, `p` shows a preview, `q` (or Ctrl-C) quits.

use std::sync::Arc;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};

use ministry_core::config::AppConfig;
use ministry_core::error::AppError;
use ministry_core::types::id::UserId;
use ministry_entity::notice::{NewNotice, Notice, NoticeCategory};
use ministry_realtime::store::MemoryNoticeStore;
use ministry_realtime::{NoticeStore, OverlayDeliveryEngine, SessionDedupTable};
use ministry_service::FormationAssigner;
use ministry_service::formation::formation_for_notice;

use crate::output::{self, FormationRow, OutputFormat};

/// Arguments for the watch command
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Identity of the signed-in user
    #[arg(short, long)]
    pub user: String,
    /// Seed the memory store with sample notices (memory provider only)
    #[arg(long)]
    pub demo: bool,
}

/// Execute the watch command
pub async fn execute(
    args: &WatchArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let identity = UserId::new(args.user.as_str());
    let assigner = super::build_assigner(config)?;

    let store = if args.demo {
        let memory = MemoryNoticeStore::with_buffer_size(config.overlay.feed_buffer_size);
        seed_demo(&memory, &identity).await?;
        Arc::new(memory) as Arc<dyn NoticeStore>
    } else {
        super::build_store(config)?
    };

    let dedup = Arc::new(match &config.overlay.session_dedup_path {
        Some(path) => SessionDedupTable::open(path),
        None => SessionDedupTable::in_memory(),
    });

    let engine = OverlayDeliveryEngine::new(store, dedup, config.overlay.clone());
    let mut active = engine.subscribe();
    let mut toasts = engine.toasts();
    engine.start(identity.clone());

    output::print_success(&format!(
        "Watching notices for '{identity}' (Enter dismisses, p previews, q quits)"
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = active.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = active.borrow_and_update().clone();
                if let Some(notice) = current {
                    show(&notice, &assigner, format);
                }
            }
            toast = toasts.recv() => {
                if let Ok(toast) = toast {
                    output::print_kv("Toast", &format!("{} {}", toast.title, toast.body));
                }
            }
            line = lines.next_line() => {
                match line? {
                    None => break,
                    Some(input) => match input.trim() {
                        "q" => break,
                        "p" => {
                            let outcome = engine.preview(
                                NoticeCategory::ScriptureOfDay,
                                "Preview",
                                "This is how the scripture of the day will look.",
                                serde_json::json!({ "reference": "Psalm 118:24" }),
                            );
                            tracing::debug!(?outcome, "Preview requested");
                        }
                        _ => {
                            if let Some(dismissed) = engine.dismiss().await {
                                output::print_kv("Dismissed", dismissed.id.as_str());
                            }
                        }
                    },
                }
            }
        }
    }

    engine.shutdown().await;
    let metrics = engine.metrics();
    output::print_kv("Shown", &metrics.accepted.to_string());
    output::print_kv("Dismissed", &metrics.dismissed.to_string());
    Ok(())
}

fn show(notice: &Notice, assigner: &FormationAssigner, format: OutputFormat) {
    output::print_notice(notice, format);
    if notice.category == NoticeCategory::ServiceProgram {
        let rows: Vec<FormationRow> = formation_for_notice(assigner, notice)
            .iter()
            .map(FormationRow::from)
            .collect();
        output::print_list(&rows, format);
    }
}

async fn seed_demo(store: &MemoryNoticeStore, identity: &UserId) -> Result<(), AppError> {
    let samples = [
        NewNotice::new(NoticeCategory::AdviceOfDay, "Advice of the day")
            .body("Be quick to listen and slow to speak."),
        NewNotice::new(NoticeCategory::RehearsalAlert, "Rehearsal moved")
            .body("Thursday rehearsal starts at 19:30.")
            .to_user(identity.clone()),
        NewNotice::new(NoticeCategory::ServiceProgram, "Sunday program").metadata(
            serde_json::json!({
                "team": "Worship",
                "time_slot": "10:30",
                "director_id": "m-esteban",
                "event_id": "demo-sunday",
            }),
        ),
    ];
    for sample in samples {
        store.insert(sample).await?;
    }
    Ok(())
}

//! Notice insertion CLI command.

use clap::Args;

use ministry_core::config::{AppConfig, StoreProvider};
use ministry_core::error::AppError;
use ministry_core::types::id::UserId;
use ministry_entity::notice::{NewNotice, NoticeCategory};

use crate::output::{self, OutputFormat};

/// Arguments for the notify command
#[derive(Debug, Args)]
pub struct NotifyArgs {
    /// Category tag (e.g. urgent_request, rehearsal_alert, chat_message)
    #[arg(short, long)]
    pub category: String,
    /// Title
    #[arg(short, long)]
    pub title: String,
    /// Body text
    #[arg(short, long, default_value = "")]
    pub body: String,
    /// Recipient user identity; everyone when omitted
    #[arg(short, long)]
    pub recipient: Option<String>,
    /// Priority ordinal; the category default when omitted
    #[arg(short, long)]
    pub priority: Option<i32>,
    /// Category-specific JSON payload
    #[arg(short, long)]
    pub metadata: Option<String>,
}

/// Execute the notify command
pub async fn execute(
    args: &NotifyArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    if config.store.provider == StoreProvider::Memory {
        output::print_warning("Memory store selected; the notice will not outlive this process");
    }

    let mut notice = NewNotice::new(NoticeCategory::from(args.category.clone()), &args.title)
        .body(&args.body);
    if let Some(recipient) = &args.recipient {
        notice = notice.to_user(UserId::new(recipient.as_str()));
    }
    if let Some(priority) = args.priority {
        notice = notice.priority(priority);
    }
    if let Some(raw) = &args.metadata {
        notice = notice.metadata(serde_json::from_str(raw)?);
    }

    let store = super::build_store(config)?;
    let stored = store.insert(notice).await?;

    tracing::info!(notice_id = %stored.id, category = %stored.category, "Notice inserted");
    match format {
        OutputFormat::Table => {
            output::print_success(&format!("Notice {} inserted", stored.id));
            output::print_kv("Class", &format!("{:?}", stored.category.class()));
            output::print_kv("Priority", &stored.priority.to_string());
        }
        OutputFormat::Json => output::print_item(&stored, format),
    }
    Ok(())
}

//! REST adapter for the managed data service's table API.
//!
//! Speaks the PostgREST dialect (`column=op.value` query filters). The
//! adapter has no realtime transport, so its change-feed subscription
//! reports `CHANNEL_ERROR` right away and the engine serves the user
//! through the fallback poll.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use ministry_core::config::StoreConfig;
use ministry_core::error::{AppError, ErrorKind};
use ministry_core::result::AppResult;
use ministry_core::types::id::NoticeId;
use ministry_entity::notice::{NewNotice, Notice, NoticeFilter, Recipient};

use super::{NoticeStore, NoticeSubscription, SubscriptionStatus};

/// Notice store backed by a PostgREST-style HTTP API.
#[derive(Debug, Clone)]
pub struct RestNoticeStore {
    client: Client,
    table_url: String,
    api_key: Option<String>,
}

impl RestNoticeStore {
    /// Build the adapter from store configuration.
    pub fn new(config: &StoreConfig) -> AppResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or_else(|| AppError::configuration("store.base_url is not set"))?;

        Ok(Self {
            client: Client::new(),
            table_url: table_url(base_url, &config.table),
            api_key: config.api_key.clone(),
        })
    }

    fn url_with(&self, query: &[(&'static str, String)]) -> AppResult<Url> {
        Url::parse_with_params(&self.table_url, query)
            .map_err(|e| AppError::configuration(format!("Invalid store URL: {e}")))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }
}

/// Endpoint for a table under the REST root.
fn table_url(base_url: &str, table: &str) -> String {
    format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table)
}

/// Query string selecting unread rows for a filter, best first.
fn unread_query(filter: &NoticeFilter) -> Vec<(&'static str, String)> {
    let broadcast = String::from(Recipient::Broadcast);
    let mut query = vec![
        ("select", "*".to_string()),
        ("is_read", "eq.false".to_string()),
        (
            "or",
            format!(
                "(recipient_id.eq.{},recipient_id.eq.{broadcast})",
                filter.recipient
            ),
        ),
    ];
    if !filter.categories.is_empty() {
        let tags: Vec<&str> = filter.categories.iter().map(|c| c.as_str()).collect();
        query.push(("category", format!("in.({})", tags.join(","))));
    }
    query.push(("order", "priority.desc,created_at.desc".to_string()));
    query
}

fn transport_error(context: &str, err: reqwest::Error) -> AppError {
    let kind = if err.is_timeout() || err.is_connect() {
        ErrorKind::ServiceUnavailable
    } else {
        ErrorKind::ExternalService
    };
    AppError::with_source(kind, format!("{context}: {err}"), err)
}

#[async_trait]
impl NoticeStore for RestNoticeStore {
    async fn fetch_unread(&self, filter: &NoticeFilter) -> AppResult<Vec<Notice>> {
        let url = self.url_with(&unread_query(filter))?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport_error("fetch unread notices", e))?;

        response
            .json::<Vec<Notice>>()
            .await
            .map_err(|e| transport_error("decode unread notices", e))
    }

    async fn subscribe_inserts(&self, filter: &NoticeFilter) -> AppResult<NoticeSubscription> {
        warn!(
            recipient = %filter.recipient,
            "REST store has no realtime transport; reporting CHANNEL_ERROR"
        );
        let (_insert_tx, insert_rx) = mpsc::channel(1);
        let (_status_tx, status_rx) = watch::channel(SubscriptionStatus::ChannelError);
        Ok(NoticeSubscription::new(insert_rx, status_rx, || {}))
    }

    async fn mark_read(&self, id: &NoticeId) -> AppResult<()> {
        let url = self.url_with(&[("id", format!("eq.{id}"))])?;
        self.authorize(self.client.patch(url))
            .header("Prefer", "return=minimal")
            .json(&json!({ "is_read": true }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport_error("mark notice read", e))?;

        debug!(notice_id = %id, "Notice marked read");
        Ok(())
    }

    async fn insert(&self, notice: NewNotice) -> AppResult<Notice> {
        notice.validate()?;
        let priority = notice.effective_priority();
        let body = json!({
            "category": notice.category,
            "title": notice.title,
            "body": notice.body,
            "metadata": notice.metadata,
            "recipient_id": notice.recipient,
            "priority": priority,
            "is_read": false,
        });

        let rows = self
            .authorize(self.client.post(&self.table_url))
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| transport_error("insert notice", e))?
            .json::<Vec<Notice>>()
            .await
            .map_err(|e| transport_error("decode inserted notice", e))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::external_service("insert returned no representation"))
    }
}

//! Overlay delivery engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for the overlay delivery engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Fallback poll interval in seconds, used while the change feed is unhealthy.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Identifier prefix for synthetic (preview) notices.
    ///
    /// Notices with this prefix bypass session dedup and are never marked read.
    #[serde(default = "default_preview_prefix")]
    pub preview_id_prefix: String,
    /// Optional JSON file persisting the session dedup table across reloads.
    #[serde(default)]
    pub session_dedup_path: Option<String>,
    /// Window in milliseconds within which identical toasts are collapsed.
    #[serde(default = "default_toast_window")]
    pub toast_window_ms: u64,
    /// Buffer size of the change-feed insert channel.
    #[serde(default = "default_feed_buffer")]
    pub feed_buffer_size: usize,
}

impl OverlayConfig {
    /// Fallback poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            preview_id_prefix: default_preview_prefix(),
            session_dedup_path: None,
            toast_window_ms: default_toast_window(),
            feed_buffer_size: default_feed_buffer(),
        }
    }
}

fn default_poll_interval() -> u64 {
    30
}

fn default_preview_prefix() -> String {
    "preview-".to_string()
}

fn default_toast_window() -> u64 {
    500
}

fn default_feed_buffer() -> usize {
    64
}

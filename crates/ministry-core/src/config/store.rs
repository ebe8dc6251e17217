//! Remote notice store configuration.

use serde::{Deserialize, Serialize};

/// Which notice store adapter to construct.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreProvider {
    /// In-process store; nothing leaves the process.
    #[default]
    Memory,
    /// REST table API of the managed data service.
    Rest,
}

/// Connection settings for the notice store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Adapter selection.
    #[serde(default)]
    pub provider: StoreProvider,
    /// Base URL of the data service (rest provider only).
    #[serde(default)]
    pub base_url: Option<String>,
    /// API key sent with every request (rest provider only).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Table holding notices.
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            provider: StoreProvider::Memory,
            base_url: None,
            api_key: None,
            table: default_table(),
        }
    }
}

fn default_table() -> String {
    "notifications".to_string()
}

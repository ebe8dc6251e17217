//! Team formation configuration.

use serde::{Deserialize, Serialize};

/// Settings for the formation assigner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormationConfig {
    /// Optional TOML roster file. The built-in roster is used when absent.
    #[serde(default)]
    pub roster_path: Option<String>,
    /// Time bucket used by teams that do not declare their own fallback.
    #[serde(default = "default_fallback_time_slot")]
    pub default_fallback_time_slot: String,
}

impl Default for FormationConfig {
    fn default() -> Self {
        Self {
            roster_path: None,
            default_fallback_time_slot: default_fallback_time_slot(),
        }
    }
}

fn default_fallback_time_slot() -> String {
    "08:00".to_string()
}

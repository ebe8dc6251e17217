//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a default, so an empty file (or no file
//! at all) yields a usable configuration.

pub mod formation;
pub mod logging;
pub mod overlay;
pub mod store;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use self::formation::FormationConfig;
pub use self::logging::LoggingConfig;
pub use self::overlay::OverlayConfig;
pub use self::store::{StoreConfig, StoreProvider};

use crate::error::AppError;

/// Prefix for environment variable overrides (`MINISTRY__OVERLAY__POLL_INTERVAL_SECONDS`).
const ENV_PREFIX: &str = "MINISTRY";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Overlay delivery settings.
    #[serde(default)]
    pub overlay: OverlayConfig,
    /// Team formation settings.
    #[serde(default)]
    pub formation: FormationConfig,
    /// Remote notice store settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the named environment.
    ///
    /// Merges `config/default.toml`, the environment overlay
    /// `config/<env>.toml`, and environment variables prefixed with
    /// `MINISTRY__`. Missing files are skipped.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(environment_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Load configuration from an explicit file path plus environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::configuration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment_source())
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.overlay.poll_interval_seconds == 0 {
            return Err(AppError::configuration(
                "overlay.poll_interval_seconds must be greater than zero",
            ));
        }
        if self.overlay.preview_id_prefix.is_empty() {
            return Err(AppError::configuration(
                "overlay.preview_id_prefix must not be empty",
            ));
        }
        if self.store.provider == StoreProvider::Rest && self.store.base_url.is_none() {
            return Err(AppError::configuration(
                "store.base_url is required for the rest provider",
            ));
        }
        Ok(())
    }
}

fn environment_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use ministry_core::config::{AppConfig, StoreProvider};
use ministry_core::error::AppError;
use ministry_service::RosterCatalog;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate the configuration and the roster it points to
    Validate,
}

/// Execute config commands
pub fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    match &args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            if shown.store.api_key.is_some() {
                shown.store.api_key = Some("****".to_string());
            }
            output::print_item(&shown, format);
        }
        ConfigCommand::Validate => {
            config.validate()?;
            let catalog = match RosterCatalog::from_config(&config.formation) {
                Ok(catalog) => catalog,
                Err(e) => {
                    output::print_error(&format!("Roster invalid: {e}"));
                    return Err(e);
                }
            };

            output::print_success("Configuration is valid");
            output::print_kv(
                "Poll interval",
                &format!("{}s", config.overlay.poll_interval_seconds),
            );
            output::print_kv("Preview prefix", &config.overlay.preview_id_prefix);
            output::print_kv(
                "Session dedup",
                config
                    .overlay
                    .session_dedup_path
                    .as_deref()
                    .unwrap_or("in memory"),
            );
            let store = match config.store.provider {
                StoreProvider::Memory => "memory".to_string(),
                StoreProvider::Rest => format!(
                    "rest ({})",
                    config.store.base_url.as_deref().unwrap_or_default()
                ),
            };
            output::print_kv("Store", &store);
            output::print_kv(
                "Roster",
                config.formation.roster_path.as_deref().unwrap_or("built-in"),
            );
            output::print_kv("Teams", &catalog.len().to_string());
        }
    }

    Ok(())
}

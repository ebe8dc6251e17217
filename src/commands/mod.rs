//! CLI command definitions and dispatch.

pub mod config;
pub mod formation;
pub mod notify;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use ministry_core::config::{AppConfig, StoreProvider};
use ministry_core::error::AppError;
use ministry_realtime::NoticeStore;
use ministry_realtime::store::{MemoryNoticeStore, RestNoticeStore};
use ministry_service::{FormationAssigner, RosterCatalog, RotationState};

use crate::output::OutputFormat;

/// Ministry overlay notices and team formations
#[derive(Debug, Parser)]
#[command(name = "ministry", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file. Without it, `config/default.toml` and
    /// `config/<env>.toml` are merged.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Environment overlay to load when no config file is given
    #[arg(short, long, env = "MINISTRY_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the overlay engine for a user and show notices as they arrive
    Watch(watch::WatchArgs),
    /// Compute the formation for an event
    Formation(formation::FormationArgs),
    /// Insert a notice into the store
    Notify(notify::NotifyArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Load configuration from the selected file or environment.
    pub fn load_config(&self) -> Result<AppConfig, AppError> {
        match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(&self.env),
        }
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Watch(args) => watch::execute(args, &config, self.format).await,
            Commands::Formation(args) => formation::execute(args, &config, self.format),
            Commands::Notify(args) => notify::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format),
        }
    }
}

/// Helper: build the configured notice store
pub fn build_store(config: &AppConfig) -> Result<Arc<dyn NoticeStore>, AppError> {
    let store: Arc<dyn NoticeStore> = match config.store.provider {
        StoreProvider::Memory => Arc::new(MemoryNoticeStore::with_buffer_size(
            config.overlay.feed_buffer_size,
        )),
        StoreProvider::Rest => Arc::new(RestNoticeStore::new(&config.store)?),
    };
    Ok(store)
}

/// Helper: build the formation assigner from the configured roster
pub fn build_assigner(config: &AppConfig) -> Result<FormationAssigner, AppError> {
    let catalog = RosterCatalog::from_config(&config.formation)?;
    Ok(FormationAssigner::new(
        Arc::new(catalog),
        Arc::new(RotationState::new()),
        &config.formation,
    ))
}

//! Formation CLI command.

use clap::Args;

use ministry_core::config::AppConfig;
use ministry_core::error::AppError;
use ministry_entity::formation::FormationRequest;

use crate::output::{self, FormationRow, OutputFormat};

/// Arguments for the formation command
#[derive(Debug, Args)]
pub struct FormationArgs {
    /// Team name
    #[arg(short, long)]
    pub team: String,
    /// Event time slot (e.g. 08:00)
    #[arg(long = "time")]
    pub time_slot: String,
    /// Director identity, kept out of the lead seat
    #[arg(short, long, default_value = "")]
    pub director: String,
    /// Event identity, drives pair rotation
    #[arg(short, long)]
    pub event: String,
}

/// Execute the formation command
pub fn execute(
    args: &FormationArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let assigner = super::build_assigner(config)?;

    let request = FormationRequest::new(
        args.team.clone(),
        args.time_slot.clone(),
        args.director.clone(),
        args.event.clone(),
    );
    let slots = assigner.assign(&request);

    if slots.is_empty() && format == OutputFormat::Table {
        output::print_warning(&format!("No formation configured for team '{}'", args.team));
        let known: Vec<&str> = assigner.catalog().team_names().collect();
        output::print_kv("Configured teams", &known.join(", "));
        return Ok(());
    }

    let rows: Vec<FormationRow> = slots.iter().map(FormationRow::from).collect();
    output::print_list(&rows, format);
    Ok(())
}

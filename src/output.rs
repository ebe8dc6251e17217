//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use ministry_entity::formation::FormationSlot;
use ministry_entity::notice::Notice;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One formation row as displayed.
#[derive(Debug, Serialize, Tabled)]
pub struct FormationRow {
    /// Seat label
    #[tabled(rename = "Seat")]
    pub seat: String,
    /// Participant display name
    #[tabled(rename = "Participant")]
    pub name: String,
    /// Participant identity
    #[tabled(rename = "ID")]
    pub id: String,
    /// Lead marker
    #[tabled(rename = "Lead")]
    pub lead: String,
}

impl From<&FormationSlot> for FormationRow {
    fn from(slot: &FormationSlot) -> Self {
        Self {
            seat: slot.slot_label.clone(),
            name: slot.participant_name.clone(),
            id: slot.participant_id.clone(),
            lead: if slot.is_team_lead { "yes" } else { "" }.to_string(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                println!("{}", Table::new(items));
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{json}");
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => println!("{item:#?}"),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{json}");
        }
    }
}

/// Print an active overlay notice
pub fn print_notice(notice: &Notice, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!();
            println!("━━ {} ━━", notice.title);
            print_kv("Category", notice.category.as_str());
            print_kv("Priority", &notice.priority.to_string());
            print_kv("Created", &notice.created_at.to_rfc3339());
            if !notice.body.is_empty() {
                println!();
                println!("{}", notice.body);
            }
        }
        OutputFormat::Json => print_item(notice, format),
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{key}:"), value);
}

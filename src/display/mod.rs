//! Display formatting for terminal output
//!
//! Formats models for the terminal either as tables or as pretty JSON.

pub mod audit;
pub mod incident;
pub mod school;
pub mod user;

use serde::Serialize;
use tabled::{Table, Tabled};

pub use audit::{audit_rows, format_audit_page, format_record_history};
pub use incident::{format_incident_details, incident_rows};
pub use school::school_rows;
pub use user::{format_user_details, user_history_link, user_rows};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Render rows in the selected format
pub fn render_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat, empty: &str) -> String {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                empty.to_string()
            } else {
                Table::new(rows).to_string()
            }
        }
        OutputFormat::Json => {
            serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
        }
    }
}

/// Render a single value as pretty JSON
pub fn render_json<T: Serialize>(item: &T) -> String {
    serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string())
}

/// Format a key-value line for detail views
pub fn kv(key: &str, value: impl std::fmt::Display) -> String {
    format!("  {:<12} {}\n", format!("{}:", key), value)
}

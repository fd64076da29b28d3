//! Incident display formatting
//!
//! Formats incidents for terminal output in table and detail views.

use serde::Serialize;
use tabled::Tabled;

use super::kv;
use crate::models::Incident;

/// One incident in a table
#[derive(Debug, Serialize, Tabled)]
pub struct IncidentRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Summary")]
    pub summary: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Owner")]
    pub owner: String,
    #[tabled(rename = "Reported")]
    pub reported: String,
}

/// Longest summary shown in a table cell
const SUMMARY_WIDTH: usize = 40;

pub fn incident_rows(incidents: &[Incident]) -> Vec<IncidentRow> {
    incidents
        .iter()
        .map(|i| IncidentRow {
            id: i.id.get(),
            summary: truncate(&i.summary, SUMMARY_WIDTH),
            status: i.status.to_string(),
            location: location(i),
            owner: i.owner_id.map(|id| id.to_string()).unwrap_or_default(),
            reported: i.created_on.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

/// Format a single incident with all of its fields
pub fn format_incident_details(incident: &Incident, history_link: &str) -> String {
    let mut output = format!("Incident #{}\n", incident.id);
    output.push_str(&kv("Summary", &incident.summary));
    output.push_str(&kv("Status", incident.status));
    output.push_str(&kv("Location", location(incident)));
    output.push_str(&kv(
        "Owner",
        incident
            .owner_id
            .map(|id| format!("user {}", id))
            .unwrap_or_else(|| "-".to_string()),
    ));
    output.push_str(&kv(
        "Reported",
        incident.created_on.format("%Y-%m-%d %H:%M UTC"),
    ));
    output.push_str(&kv("History", history_link));

    if !incident.details.is_empty() {
        output.push('\n');
        output.push_str(&incident.details);
        output.push('\n');
    }

    output
}

fn location(incident: &Incident) -> String {
    if incident.city.is_empty() {
        incident.state.clone()
    } else {
        format!("{}, {}", incident.city, incident.state)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

//! Audit log display formatting
//!
//! Table view of audit pages and a chronological history view for one
//! entity.

use serde::Serialize;
use tabled::Tabled;

use super::{render_list, OutputFormat};
use crate::audit::{summarize_changes, AuditPage, AuditRecordView};

/// One audit record in a table
#[derive(Debug, Serialize, Tabled)]
pub struct AuditRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Time (UTC)")]
    pub time: String,
    #[tabled(rename = "Action")]
    pub action: String,
    #[tabled(rename = "Record")]
    pub record: String,
    #[tabled(rename = "Actor")]
    pub actor: String,
    #[tabled(rename = "Changes")]
    pub changes: String,
}

pub fn audit_rows(views: &[AuditRecordView]) -> Vec<AuditRow> {
    views
        .iter()
        .map(|v| AuditRow {
            id: v.record.id.get(),
            time: v.record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            action: v.record.action.to_string(),
            record: v.record.subject(),
            actor: v.actor.label.clone(),
            changes: v
                .record
                .changes
                .as_ref()
                .map(summarize_changes)
                .unwrap_or_default(),
        })
        .collect()
}

/// Format a page of records with a position footer
pub fn format_audit_page(page: &AuditPage, views: &[AuditRecordView], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => super::render_json(&views),
        OutputFormat::Table => {
            let rows = audit_rows(views);
            let mut output = render_list(&rows, format, "No audit records found.");
            if !rows.is_empty() {
                output.push_str(&format!(
                    "\nShowing {}-{} of {}",
                    page.offset + 1,
                    page.offset + rows.len(),
                    page.total
                ));
                if page.has_more() {
                    output.push_str(&format!(" (next: --offset {})", page.offset + rows.len()));
                }
            }
            output
        }
    }
}

/// Format the history of one entity, oldest first
pub fn format_record_history(subject: &str, views: &[AuditRecordView]) -> String {
    if views.is_empty() {
        return format!("No history for {}.", subject);
    }

    let mut output = format!(
        "History of {} ({} record{})\n",
        subject,
        views.len(),
        if views.len() == 1 { "" } else { "s" }
    );
    for view in views {
        let record = &view.record;
        output.push_str(&format!(
            "\n[{}] {} by {}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            record.action,
            view.actor.label
        ));
        if let Some(changes) = &record.changes {
            for (column, change) in changes {
                output.push_str(&format!(
                    "\n    {}: {} -> {}",
                    column,
                    crate::audit::format_value(&change.old),
                    crate::audit::format_value(&change.new)
                ));
            }
        }
    }
    output.push('\n');
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{ActorLabel, AuditAction, AuditModel, AuditRecord, ChangeSet, FieldChange};
    use crate::models::AuditRecordId;
    use chrono::Utc;
    use serde_json::json;

    fn view(id: i64, action: AuditAction, changes: Option<ChangeSet>) -> AuditRecordView {
        AuditRecordView {
            record: AuditRecord {
                id: AuditRecordId::new(id),
                model_name: AuditModel::Incident,
                action,
                record_id: 42,
                user_id: None,
                timestamp: Utc::now(),
                changes,
            },
            actor: ActorLabel {
                user_id: None,
                label: "System".into(),
                link: None,
            },
        }
    }

    fn summary_change() -> ChangeSet {
        ChangeSet::from([(
            "summary".to_string(),
            FieldChange::new(json!("A"), json!("B")),
        )])
    }

    #[test]
    fn test_rows() {
        let rows = audit_rows(&[view(1, AuditAction::Update, Some(summary_change()))]);
        assert_eq!(rows[0].record, "Incident#42");
        assert_eq!(rows[0].actor, "System");
        assert_eq!(rows[0].changes, "summary: \"A\" -> \"B\"");
    }

    #[test]
    fn test_page_footer() {
        let views = vec![view(1, AuditAction::Insert, None)];
        let page = AuditPage {
            records: views.iter().map(|v| v.record.clone()).collect(),
            total: 3,
            offset: 0,
            limit: 1,
        };
        let output = format_audit_page(&page, &views, OutputFormat::Table);
        assert!(output.contains("Showing 1-1 of 3 (next: --offset 1)"));
    }

    #[test]
    fn test_json_page_carries_actor() {
        let views = vec![view(1, AuditAction::Insert, None)];
        let page = AuditPage {
            records: views.iter().map(|v| v.record.clone()).collect(),
            total: 1,
            offset: 0,
            limit: 50,
        };
        let output = format_audit_page(&page, &views, OutputFormat::Json);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["record_id"], 42);
        assert_eq!(json[0]["actor"]["label"], "System");
        assert!(json[0]["actor"]["link"].is_null());
    }

    #[test]
    fn test_history_view() {
        let views = vec![
            view(1, AuditAction::Insert, None),
            view(2, AuditAction::Update, Some(summary_change())),
        ];
        let output = format_record_history("Incident#42", &views);
        assert!(output.starts_with("History of Incident#42 (2 records)"));
        assert!(output.contains("INSERT by System"));
        assert!(output.contains("summary: \"A\" -> \"B\""));
        assert_eq!(format_record_history("User#1", &[]), "No history for User#1.");
    }
}

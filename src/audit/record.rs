//! Audit record data structures
//!
//! Defines the actions and audited models that can appear in the log, and
//! the record format itself.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{AuditRecordId, UserId};

use super::serialize::summarize_changes;

/// Kind of mutation recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    /// Entity was created
    Insert,
    /// At least one column of the entity changed
    Update,
    /// Entity was deleted
    Delete,
}

impl AuditAction {
    /// Parse an action from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Insert => write!(f, "INSERT"),
            AuditAction::Update => write!(f, "UPDATE"),
            AuditAction::Delete => write!(f, "DELETE"),
        }
    }
}

/// Entity types whose mutations are audited
///
/// Anything that cannot be mapped to a variant here is not audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuditModel {
    Incident,
    User,
}

impl AuditModel {
    /// All audited models
    pub const ALL: [AuditModel; 2] = [AuditModel::Incident, AuditModel::User];

    /// Map an entity type name onto the allow-list
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.type_name() == type_name)
    }

    /// Entity type name this model audits
    pub fn type_name(&self) -> &'static str {
        match self {
            AuditModel::Incident => "Incident",
            AuditModel::User => "User",
        }
    }

    /// Case-insensitive parse, for command-line input
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.type_name().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for AuditModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Old and new value of one changed column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: Value,
    pub new: Value,
}

impl FieldChange {
    pub fn new(old: Value, new: Value) -> Self {
        Self { old, new }
    }
}

/// Changed columns of an `UPDATE`, keyed by column name
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// An audit record that has been staged but not yet committed
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAuditRecord {
    pub model_name: AuditModel,
    pub action: AuditAction,
    pub record_id: i64,
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    pub changes: Option<ChangeSet>,
}

/// A committed, immutable audit record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// Assigned at commit; strictly increasing
    pub id: AuditRecordId,

    /// Audited entity type
    pub model_name: AuditModel,

    /// Kind of mutation
    pub action: AuditAction,

    /// Primary key of the mutated entity
    pub record_id: i64,

    /// Acting user; `None` for system actions
    pub user_id: Option<UserId>,

    /// When the change was recorded (UTC)
    pub timestamp: DateTime<Utc>,

    /// Changed columns, for updates only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<ChangeSet>,
}

impl AuditRecord {
    /// Commit a staged record under the given id
    pub fn from_pending(id: AuditRecordId, pending: PendingAuditRecord) -> Self {
        Self {
            id,
            model_name: pending.model_name,
            action: pending.action,
            record_id: pending.record_id,
            user_id: pending.user_id,
            timestamp: pending.timestamp,
            changes: pending.changes,
        }
    }

    /// "Incident#42"
    pub fn subject(&self) -> String {
        format!("{}#{}", self.model_name, self.record_id)
    }

    /// Format the record for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.action,
            self.subject()
        );

        match self.user_id {
            Some(user_id) => output.push_str(&format!(" by user {}", user_id)),
            None => output.push_str(" by system"),
        }

        if let Some(changes) = &self.changes {
            output.push_str(&format!("\n  Changes: {}", summarize_changes(changes)));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update_record() -> AuditRecord {
        let mut changes = ChangeSet::new();
        changes.insert(
            "status".into(),
            FieldChange::new(json!("Active"), json!("Filed")),
        );
        AuditRecord {
            id: AuditRecordId::new(1),
            model_name: AuditModel::Incident,
            action: AuditAction::Update,
            record_id: 42,
            user_id: Some(UserId::new(3)),
            timestamp: Utc::now(),
            changes: Some(changes),
        }
    }

    #[test]
    fn test_action_display_and_parse() {
        assert_eq!(AuditAction::Insert.to_string(), "INSERT");
        assert_eq!(AuditAction::parse("delete"), Some(AuditAction::Delete));
        assert_eq!(AuditAction::parse("upsert"), None);
    }

    #[test]
    fn test_allow_list() {
        assert_eq!(AuditModel::from_type_name("Incident"), Some(AuditModel::Incident));
        assert_eq!(AuditModel::from_type_name("User"), Some(AuditModel::User));
        assert_eq!(AuditModel::from_type_name("School"), None);
        assert_eq!(AuditModel::parse("incident"), Some(AuditModel::Incident));
    }

    #[test]
    fn test_serialization_shape() {
        let record = update_record();
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["model_name"], "Incident");
        assert_eq!(json["action"], "UPDATE");
        assert_eq!(json["record_id"], 42);
        assert_eq!(json["user_id"], 3);
        assert_eq!(
            json["changes"],
            json!({"status": {"old": "Active", "new": "Filed"}})
        );

        let back: AuditRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_system_actor_serializes_as_null() {
        let mut record = update_record();
        record.user_id = None;
        record.changes = None;
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["user_id"].is_null());
        assert!(json.get("changes").is_none());
    }

    #[test]
    fn test_human_readable_format() {
        let formatted = update_record().format_human_readable();
        assert!(formatted.contains("UPDATE Incident#42 by user 3"));
        assert!(formatted.contains("status: \"Active\" -> \"Filed\""));
    }
}

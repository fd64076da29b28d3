//! Incident model
//!
//! Represents a reported incident of hate or bias at a school.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{IncidentId, UserId};
use crate::session::{ColumnEnum, ColumnValue, Entity, Row};

/// Longest summary accepted, in characters
pub const MAX_SUMMARY_LEN: usize = 200;

/// Workflow status of an incident
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    /// Still being worked on
    #[default]
    Active,
    /// Reported to the appropriate authority
    Filed,
}

impl IncidentStatus {
    /// Parse status from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "filed" => Some(Self::Filed),
            _ => None,
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ColumnEnum for IncidentStatus {
    const TYPE_NAME: &'static str = "IncidentStatus";

    fn name(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Filed => "Filed",
        }
    }

    fn value(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Filed => "filed",
        }
    }
}

/// A reported incident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Unique identifier
    pub id: IncidentId,

    /// One-line summary
    pub summary: String,

    /// Free-form description
    #[serde(default)]
    pub details: String,

    /// Workflow status
    #[serde(default)]
    pub status: IncidentStatus,

    /// City where the incident happened
    #[serde(default)]
    pub city: String,

    /// Two-letter state code
    pub state: String,

    /// User responsible for following up
    pub owner_id: Option<UserId>,

    /// When the incident was reported
    pub created_on: DateTime<Utc>,
}

impl Incident {
    /// Create a new active incident
    pub fn new(id: IncidentId, summary: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id,
            summary: summary.into(),
            details: String::new(),
            status: IncidentStatus::Active,
            city: String::new(),
            state: state.into().to_uppercase(),
            owner_id: None,
            created_on: Utc::now(),
        }
    }

    /// Mark this incident as filed
    pub fn file(&mut self) {
        self.status = IncidentStatus::Filed;
    }

    /// Validate the incident
    ///
    /// Summary length is measured in characters, not bytes.
    pub fn validate(&self) -> Result<(), IncidentValidationError> {
        if self.summary.trim().is_empty() {
            return Err(IncidentValidationError::EmptySummary);
        }

        let summary_len = self.summary.chars().count();
        if summary_len > MAX_SUMMARY_LEN {
            return Err(IncidentValidationError::SummaryTooLong(summary_len));
        }

        if self.state.len() != 2 || !self.state.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(IncidentValidationError::InvalidState(self.state.clone()));
        }

        Ok(())
    }
}

impl Entity for Incident {
    const TYPE_NAME: &'static str = "Incident";
    type Id = IncidentId;

    fn id(&self) -> IncidentId {
        self.id
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id", self.id.get().into());
        row.insert("summary", (&self.summary).into());
        row.insert("details", (&self.details).into());
        row.insert("status", ColumnValue::enumeration(self.status));
        row.insert("city", (&self.city).into());
        row.insert("state", (&self.state).into());
        row.insert("owner_id", ColumnValue::optional(self.owner_id.map(|id| id.get())));
        row.insert("created_on", self.created_on.into());
        row
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.id, self.summary, self.status)
    }
}

/// Validation errors for incidents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentValidationError {
    EmptySummary,
    SummaryTooLong(usize),
    InvalidState(String),
}

impl fmt::Display for IncidentValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySummary => write!(f, "Incident summary cannot be empty"),
            Self::SummaryTooLong(len) => {
                write!(
                    f,
                    "Incident summary too long ({} chars, max {})",
                    len, MAX_SUMMARY_LEN
                )
            }
            Self::InvalidState(state) => {
                write!(f, "State must be a two-letter code, got '{}'", state)
            }
        }
    }
}

impl std::error::Error for IncidentValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_incident() {
        let incident = Incident::new(IncidentId::new(1), "Graffiti", "ny");
        assert_eq!(incident.summary, "Graffiti");
        assert_eq!(incident.state, "NY");
        assert_eq!(incident.status, IncidentStatus::Active);
        assert!(incident.owner_id.is_none());
    }

    #[test]
    fn test_validation() {
        let mut incident = Incident::new(IncidentId::new(1), "Valid", "CA");
        assert!(incident.validate().is_ok());

        incident.summary = "  ".into();
        assert_eq!(
            incident.validate(),
            Err(IncidentValidationError::EmptySummary)
        );

        incident.summary = "Valid".into();
        incident.state = "California".into();
        assert!(matches!(
            incident.validate(),
            Err(IncidentValidationError::InvalidState(_))
        ));
    }

    #[test]
    fn test_summary_length_counts_chars() {
        let mut incident = Incident::new(IncidentId::new(1), "א".repeat(101), "NY");
        assert!(incident.validate().is_ok());

        incident.summary = "א".repeat(MAX_SUMMARY_LEN);
        assert!(incident.validate().is_ok());

        incident.summary = "א".repeat(MAX_SUMMARY_LEN + 1);
        assert_eq!(
            incident.validate(),
            Err(IncidentValidationError::SummaryTooLong(MAX_SUMMARY_LEN + 1))
        );
    }

    #[test]
    fn test_status_column_is_symbolic() {
        let mut incident = Incident::new(IncidentId::new(1), "Flyers", "TX");
        incident.file();

        let row = incident.to_row();
        assert_eq!(
            row.get("status"),
            Some(&ColumnValue::Enum {
                type_name: "IncidentStatus",
                name: "Filed",
                value: "filed",
            })
        );
        assert_eq!(row.get("owner_id"), Some(&ColumnValue::Null));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(IncidentStatus::parse("FILED"), Some(IncidentStatus::Filed));
        assert_eq!(IncidentStatus::parse("closed"), None);
    }

    #[test]
    fn test_serialization() {
        let incident = Incident::new(IncidentId::new(3), "Slur", "WA");
        let json = serde_json::to_value(&incident).unwrap();
        assert_eq!(json["status"], "active");
        let back: Incident = serde_json::from_value(json).unwrap();
        assert_eq!(back, incident);
    }
}

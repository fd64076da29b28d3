//! School model
//!
//! Reference data. Schools are persisted through the same session as audited
//! entities but are not part of the audit log.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::SchoolId;
use crate::session::{Entity, Row};

/// A school where incidents can be reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub city: String,
    /// Two-letter state code
    pub state: String,
}

impl School {
    pub fn new(id: SchoolId, name: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            city: String::new(),
            state: state.into().to_uppercase(),
        }
    }

    /// Validate the school
    pub fn validate(&self) -> Result<(), SchoolValidationError> {
        if self.name.trim().is_empty() {
            return Err(SchoolValidationError::EmptyName);
        }
        if self.state.len() != 2 || !self.state.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(SchoolValidationError::InvalidState(self.state.clone()));
        }
        Ok(())
    }
}

impl Entity for School {
    const TYPE_NAME: &'static str = "School";
    type Id = SchoolId;

    fn id(&self) -> SchoolId {
        self.id
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id", self.id.get().into());
        row.insert("name", (&self.name).into());
        row.insert("city", (&self.city).into());
        row.insert("state", (&self.state).into());
        row
    }
}

impl fmt::Display for School {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.state)
    }
}

/// Validation errors for schools
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchoolValidationError {
    EmptyName,
    InvalidState(String),
}

impl fmt::Display for SchoolValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "School name cannot be empty"),
            Self::InvalidState(state) => {
                write!(f, "State must be a two-letter code, got '{}'", state)
            }
        }
    }
}

impl std::error::Error for SchoolValidationError {}

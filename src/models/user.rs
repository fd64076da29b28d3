//! User model
//!
//! Staff members who administer incidents. Every audit record points at the
//! user who made the change.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;
use crate::session::{ColumnEnum, ColumnValue, Entity, Row};

/// Permission role granted to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
}

impl UserRole {
    /// Parse role from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "editor" => Some(Self::Editor),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl ColumnEnum for UserRole {
    const TYPE_NAME: &'static str = "UserRole";

    fn name(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Editor => "Editor",
        }
    }

    fn value(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
        }
    }
}

/// A staff user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: UserId,

    pub first_name: String,

    pub last_name: String,

    /// Login email; unique across users
    pub email: String,

    /// Granted roles, kept sorted and deduplicated
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl User {
    /// Create a user with no roles
    pub fn new(
        id: UserId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into().trim().to_lowercase(),
            roles: Vec::new(),
        }
    }

    /// Builder-style role assignment
    pub fn with_roles(mut self, roles: impl IntoIterator<Item = UserRole>) -> Self {
        self.set_roles(roles);
        self
    }

    /// Replace the user's roles
    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = UserRole>) {
        let mut roles: Vec<UserRole> = roles.into_iter().collect();
        roles.sort();
        roles.dedup();
        self.roles = roles;
    }

    /// Check whether the user holds a role
    pub fn has_role(&self, role: UserRole) -> bool {
        self.roles.contains(&role)
    }

    /// "First Last"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Validate the user
    pub fn validate(&self) -> Result<(), UserValidationError> {
        if self.first_name.trim().is_empty() && self.last_name.trim().is_empty() {
            return Err(UserValidationError::EmptyName);
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(UserValidationError::InvalidEmail(self.email.clone())),
        }

        Ok(())
    }
}

impl Entity for User {
    const TYPE_NAME: &'static str = "User";
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("id", self.id.get().into());
        row.insert("first_name", (&self.first_name).into());
        row.insert("last_name", (&self.last_name).into());
        row.insert("email", (&self.email).into());
        row.insert(
            "roles",
            ColumnValue::List(self.roles.iter().map(|r| ColumnValue::enumeration(*r)).collect()),
        );
        row
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.full_name(), self.email)
    }
}

/// Validation errors for users
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyName,
    InvalidEmail(String),
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "User must have a first or last name"),
            Self::InvalidEmail(email) => write!(f, "Invalid email address: '{}'", email),
        }
    }
}

impl std::error::Error for UserValidationError {}

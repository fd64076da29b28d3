//! Core data models for incident-tracker
//!
//! This module contains the entities persisted through the session:
//! incidents, users and schools, plus their strongly-typed ids.

pub mod ids;
pub mod incident;
pub mod school;
pub mod user;

pub use ids::{AuditRecordId, IncidentId, SchoolId, UserId};
pub use incident::{Incident, IncidentStatus, IncidentValidationError};
pub use school::{School, SchoolValidationError};
pub use user::{User, UserRole, UserValidationError};

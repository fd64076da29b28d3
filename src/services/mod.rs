//! Service layer for incident-tracker
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation and cross-entity checks. Each service opens one
//! audited session per mutation.

pub mod incident;
pub mod school;
pub mod user;

pub use incident::{IncidentService, IncidentUpdate, NewIncident};
pub use school::SchoolService;
pub use user::{UserService, UserUpdate};

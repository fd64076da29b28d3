//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod audit;
pub mod incident;
pub mod school;
pub mod user;

pub use audit::{handle_audit_command, AuditCommands};
pub use incident::{handle_incident_command, IncidentCommands};
pub use school::{handle_school_command, SchoolCommands};
pub use user::{handle_user_command, UserCommands};

use crate::audit::Actor;
use crate::error::{TrackerError, TrackerResult};
use crate::models::{User, UserId};
use crate::storage::Storage;

/// Resolve the `--as-user` option to an actor
///
/// The user must exist; without the option commands run as the system.
pub fn resolve_actor(storage: &Storage, as_user: Option<UserId>) -> TrackerResult<Actor> {
    match as_user {
        None => Ok(Actor::System),
        Some(id) => match storage.get::<User>(id)? {
            Some(_) => Ok(Actor::User(id)),
            None => Err(TrackerError::user_not_found(id.to_string())),
        },
    }
}

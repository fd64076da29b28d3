//! incident-tracker - incident report administration with row-level auditing
//!
//! This library provides the core of an administrative tool for incident
//! reports. Every insert, update and delete of an audited entity is recorded
//! as an immutable audit record, attributed to the acting user and committed
//! atomically with the change itself.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `session`: Unit of work with identity map, flush hooks and atomic commit
//! - `audit`: Change tracking, audit log writing and querying
//! - `models`: Core data models (incidents, users, schools)
//! - `storage`: JSON document storage
//! - `services`: Business logic layer
//! - `cli` / `display`: Command handlers and terminal formatting
//!
//! # Example
//!
//! ```rust,ignore
//! use incident_tracker::audit::Actor;
//! use incident_tracker::config::paths::TrackerPaths;
//! use incident_tracker::storage::Storage;
//!
//! let mut storage = Storage::open(TrackerPaths::new()?)?;
//! let mut session = storage.begin(Actor::System);
//! session.add(incident)?;
//! session.commit()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod storage;

pub use error::{TrackerError, TrackerResult};

//! Unit of work for incident-tracker
//!
//! A [`Session`] batches entity creations, modifications and deletions until
//! commit. It keeps an identity map with the last-flushed column image of
//! every tracked entity, so hooks registered on it can inspect exactly what
//! a flush is about to change.
//!
//! The audit core does not depend on [`Session`] directly: it consumes the
//! [`UnitOfWork`] trait and plugs in through [`FlushHook`].

mod entity;
mod transaction;
mod unit_of_work;
mod value;

pub use entity::{Entity, EntityId, EntityKey};
pub use transaction::{CommitSummary, Session};
pub use unit_of_work::{ColumnHistory, FlushContext, FlushHook, UnitOfWork};
pub use value::{ColumnEnum, ColumnValue, Row};

//! Column values as seen by the unit of work
//!
//! Entities describe their persisted columns as a [`Row`] of [`ColumnValue`]s.
//! Rows are what the session snapshots at flush time and what column history
//! is computed from.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A persisted column image, keyed by column name
pub type Row = BTreeMap<&'static str, ColumnValue>;

/// Enumerations stored in a column
///
/// The symbolic `name` is the variant name shown to people; `value` is the
/// representation written to storage.
pub trait ColumnEnum: Copy {
    /// Name of the enumeration type (e.g. `IncidentStatus`)
    const TYPE_NAME: &'static str;

    /// Symbolic variant name (e.g. `Active`)
    fn name(&self) -> &'static str;

    /// Stored representation (e.g. `active`)
    fn value(&self) -> &'static str;
}

/// A single column value
///
/// Equality is value equality: two rows loaded separately compare equal when
/// their contents match.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Enum {
        type_name: &'static str,
        name: &'static str,
        value: &'static str,
    },
    List(Vec<ColumnValue>),
}

impl ColumnValue {
    /// Wrap an enumeration value
    pub fn enumeration<E: ColumnEnum>(value: E) -> Self {
        Self::Enum {
            type_name: E::TYPE_NAME,
            name: value.name(),
            value: value.value(),
        }
    }

    /// Convert an optional value, mapping `None` to `Null`
    pub fn optional<T: Into<ColumnValue>>(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }

    /// Build a list column from its elements
    pub fn list<T, I>(items: I) -> Self
    where
        T: Into<ColumnValue>,
        I: IntoIterator<Item = T>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ColumnValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for ColumnValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<DateTime<Utc>> for ColumnValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

//! Strongly-typed ID wrappers for all entity types
//!
//! Using newtype wrappers prevents accidentally mixing up IDs from different
//! entity types at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use crate::session::EntityId;

/// Macro to generate integer ID newtype wrappers
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw primary key
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw primary key
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Accept "#42" as well as "42"
                let s = s.trim();
                let s = s.strip_prefix('#').unwrap_or(s);
                Ok(Self(s.parse()?))
            }
        }

        impl EntityId for $name {
            fn from_raw(raw: i64) -> Self {
                Self(raw)
            }

            fn raw(&self) -> i64 {
                self.0
            }
        }
    };
}

define_id!(IncidentId);
define_id!(UserId);
define_id!(SchoolId);
define_id!(AuditRecordId);

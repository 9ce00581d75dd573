//! Job priority
//!
//! A priority is either a computed value or `Unset`. `Unset` means the
//! priority must be recomputed before the job can be scheduled; on the wire
//! it is the integer -1.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Wire value of an unset priority
pub const PRIORITY_UNSET: i64 = -1;

/// A job's scheduling priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Priority {
    /// Needs (re)computation
    #[default]
    Unset,
    /// Computed priority
    Value(i64),
}

impl Priority {
    /// True when the priority must be recomputed
    pub fn is_unset(&self) -> bool {
        matches!(self, Priority::Unset)
    }

    /// Returns the computed value, if any
    pub fn value(&self) -> Option<i64> {
        match self {
            Priority::Unset => None,
            Priority::Value(v) => Some(*v),
        }
    }

    /// Returns the wire integer (-1 when unset)
    pub fn to_wire(&self) -> i64 {
        self.value().unwrap_or(PRIORITY_UNSET)
    }

    /// Builds a priority from its wire integer
    pub fn from_wire(value: i64) -> Self {
        if value == PRIORITY_UNSET {
            Priority::Unset
        } else {
            Priority::Value(value)
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Unset => write!(f, "unset"),
            Priority::Value(v) => write!(f, "{}", v),
        }
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.to_wire())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i64::deserialize(deserializer).map(Priority::from_wire)
    }
}

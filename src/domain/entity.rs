//! Identity and value semantics shared by the domain types
//!
//! Entities are equal when they carry the same id, whatever their current
//! state. Value objects are plain `PartialEq` types that never change after
//! construction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity-bearing domain object.
pub trait Entity {
    type Id: Clone + Eq + std::hash::Hash + fmt::Debug;

    fn id(&self) -> &Self::Id;

    /// Identity equality: two snapshots of the same entity compare equal.
    fn same_identity(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

/// Marker for immutable types compared by value.
pub trait ValueObject: Clone + PartialEq + fmt::Debug {}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Fresh random id.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Blank ids come from malformed input and never reference a
            /// stored entity.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Vehicle`](crate::domain::Vehicle).
    VehicleId
);
entity_id!(
    /// Identifier of a [`User`](crate::domain::User).
    UserId
);
entity_id!(
    /// Identifier of a [`Reservation`](crate::domain::Reservation).
    ReservationId
);

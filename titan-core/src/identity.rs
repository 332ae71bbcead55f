//! Identity types for TITAN entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Common behavior of the strongly-typed entity identifiers.
///
/// Identifiers are UUIDv7, so they sort by creation time.
pub trait EntityIdType: Copy + Eq + std::hash::Hash + fmt::Display + fmt::Debug {
    /// Wrap a raw UUID.
    fn new(uuid: Uuid) -> Self;

    /// Access the raw UUID (for storage bindings).
    fn as_uuid(&self) -> Uuid;

    /// Generate a new timestamp-sortable identifier.
    fn now_v7() -> Self {
        Self::new(Uuid::now_v7())
    }
}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl EntityIdType for $name {
            fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Uuid {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

entity_id!(
    /// Athlete a template depicts. Owned by the catalog, opaque here.
    AthleteId
);
entity_id!(
    /// Printable/mintable card design.
    TemplateId
);
entity_id!(
    /// One physical card bound to one NFC tag.
    CardId
);
entity_id!(
    /// Append-only audit record of a scan.
    ScanEventId
);
entity_id!(
    /// Authenticated principal supplied by the session layer.
    PrincipalId
);

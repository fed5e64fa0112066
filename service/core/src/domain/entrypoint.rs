// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Entrypoint Aggregate
//!
//! An entrypoint is a user-owned, named launch configuration. Its shape is
//! dictated by the entrypoint type it references; the payload itself is an
//! opaque JSON object that only the type knows how to interpret.
//!
//! | Type | Description |
//! |------|-------------|
//! | `EntrypointUuid` | Stable external handle, survives renames |
//! | `EntrypointLookup` | Name xor uuid, never both |
//! | `EntrypointRecord` | Single entrypoint plus its sorted context names |
//! | `EntrypointListing` | context → type → entrypoints, with selection flags |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::repository::StoreError;

/// Type-specific entrypoint payload.
pub type EntrypointData = Map<String, Value>;

/// Key every entrypoint payload carries.
pub const ENTRYPOINT_NAME_FIELD: &str = "entrypoint_name";

/// The name an entrypoint payload declares for itself.
pub fn entrypoint_name_from(data: &EntrypointData) -> Option<&str> {
    data.get(ENTRYPOINT_NAME_FIELD).and_then(Value::as_str)
}

// ============================================================================
// Value Objects
// ============================================================================

/// Globally unique external identifier for an entrypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntrypointUuid(pub Uuid);

impl EntrypointUuid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for EntrypointUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntrypointUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored entrypoint row.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrypoint {
    /// Surrogate key, only meaningful inside the store
    pub id: i64,
    pub uuid: EntrypointUuid,
    pub user: String,
    pub name: String,
    pub entrypoint_type: String,
    pub data: EntrypointData,
}

/// How a single entrypoint is addressed within one user's namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrypointLookup {
    Name(String),
    Uuid(EntrypointUuid),
}

impl EntrypointLookup {
    /// Build a lookup from optional parts; exactly one must be present.
    pub fn from_parts(
        name: Option<String>,
        uuid: Option<EntrypointUuid>,
    ) -> Result<Self, StoreError> {
        match (name, uuid) {
            (Some(name), None) => Ok(Self::Name(name)),
            (None, Some(uuid)) => Ok(Self::Uuid(uuid)),
            (Some(_), Some(_)) => Err(StoreError::InvalidLookup(
                "entrypoint name and uuid are mutually exclusive".to_string(),
            )),
            (None, None) => Err(StoreError::InvalidLookup(
                "entrypoint name or uuid required".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for EntrypointLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "name '{}'", name),
            Self::Uuid(uuid) => write!(f, "uuid {}", uuid),
        }
    }
}

/// Optional conjunctive filters for listing a user's entrypoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EntrypointFilter {
    #[serde(default)]
    pub entrypoint_type: Option<String>,
    #[serde(default)]
    pub context_name: Option<String>,
}

// ============================================================================
// Read Models
// ============================================================================

/// A single entrypoint as returned by `retrieve_one`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrypointRecord {
    pub uuid: EntrypointUuid,
    pub entrypoint_name: String,
    pub entrypoint_type: String,
    pub entrypoint_data: EntrypointData,
    /// Sorted by name
    pub context_names: Vec<String>,
}

/// One entry of a listing, flagged when it is the selection for its context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedEntrypoint {
    pub uuid: EntrypointUuid,
    pub entrypoint_name: String,
    pub entrypoint_data: EntrypointData,
    pub selected: bool,
}

/// context name → entrypoint type name → entrypoints ordered by name.
pub type EntrypointListing = BTreeMap<String, BTreeMap<String, Vec<ListedEntrypoint>>>;

/// The entrypoint currently selected for a (user, context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEntrypoint {
    pub entrypoint_type: String,
    pub entrypoint_data: EntrypointData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_requires_exactly_one_part() {
        let uuid = EntrypointUuid::new();

        assert_eq!(
            EntrypointLookup::from_parts(Some("conda1".into()), None).unwrap(),
            EntrypointLookup::Name("conda1".into())
        );
        assert_eq!(
            EntrypointLookup::from_parts(None, Some(uuid)).unwrap(),
            EntrypointLookup::Uuid(uuid)
        );
        assert!(matches!(
            EntrypointLookup::from_parts(Some("conda1".into()), Some(uuid)),
            Err(StoreError::InvalidLookup(_))
        ));
        assert!(matches!(
            EntrypointLookup::from_parts(None, None),
            Err(StoreError::InvalidLookup(_))
        ));
    }

    #[test]
    fn test_uuid_round_trips_through_string() {
        let uuid = EntrypointUuid::new();
        let parsed = EntrypointUuid::from_string(&uuid.to_string()).unwrap();
        assert_eq!(uuid, parsed);
        assert!(EntrypointUuid::from_string("not-a-uuid").is_err());
    }

    #[test]
    fn test_name_from_data() {
        let mut data = EntrypointData::new();
        assert_eq!(entrypoint_name_from(&data), None);

        data.insert(ENTRYPOINT_NAME_FIELD.into(), Value::String("conda1".into()));
        assert_eq!(entrypoint_name_from(&data), Some("conda1"));

        data.insert(ENTRYPOINT_NAME_FIELD.into(), Value::Bool(true));
        assert_eq!(entrypoint_name_from(&data), None);
    }
}

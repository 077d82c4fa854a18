//! Identity of stored ledger rows.
//!
//! A fill or trip keeps its [`RecordId`] through every edit, so the
//! recompute engine can tell "same record, new odometer" apart from a
//! delete followed by an insert. The id says nothing about ordering; that
//! comes from the timestamp and the store-assigned sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Key of one row in `repostajes` or `recorridos`.
///
/// Minted by the store on append. Serialized as the bare UUID string used in
/// URLs and the `id` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    /// Fresh random id for a row about to be appended.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Wraps a UUID taken from a path parameter or a database row.
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// UUID for binding into SQL.
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for RecordId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RecordId> for uuid::Uuid {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Which table a record lives in; used in not-found messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Fuel purchases (`repostajes`).
    Fill,
    /// Odometer-delimited journeys (`recorridos`).
    Trip,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fill => f.write_str("fill event"),
            Self::Trip => f.write_str("trip"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn serializes_as_bare_uuid_string() {
        let id = RecordId::new();
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn path_uuid_maps_to_the_same_record() {
        let uuid = uuid::Uuid::new_v4();
        let id = RecordId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(uuid::Uuid::from(id), uuid);
    }

    #[test]
    fn entity_kind_display() {
        assert_eq!(EntityKind::Fill.to_string(), "fill event");
        assert_eq!(EntityKind::Trip.to_string(), "trip");
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::iri::Iri;

/// Which per-actor ordered collection a membership record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    Inbox,
    Outbox,
}

impl CollectionKind {
    /// The trailing path segment of a collection of this kind.
    pub fn segment(&self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Unique identifier for a membership record (UUID v7, time-ordered).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", &self.0.to_string()[..8])
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted fact that `item` belongs to the collection at `collection`.
///
/// Records are append-only: backends never update or delete them, and at
/// most one record exists per `(collection, item)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: RecordId,
    pub kind: CollectionKind,
    pub collection: Iri,
    pub item: Iri,
    /// Username of the actor owning the collection.
    pub owner: String,
    pub created_at: DateTime<Utc>,
}

impl MembershipRecord {
    pub fn new(
        kind: CollectionKind,
        collection: Iri,
        item: Iri,
        owner: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            kind,
            collection,
            item,
            owner: owner.into(),
            created_at,
        }
    }
}

//! Outbound repository interfaces consumed by the federation adapter.
//!
//! Any backend (in-memory, relational, key-value) implements these traits.
//! All of them are async and thread-safe; the adapter calls them from many
//! request tasks at once.

use async_trait::async_trait;
use exlibris_types::{Actor, Iri, MembershipRecord, ProfileUpdate, ReadActivity};

use crate::error::StoreResult;

/// Account lookup by username.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an actor without related data (`followers` is empty).
    ///
    /// Returns `Ok(None)` if no account has this username.
    async fn get_by_username(&self, username: &str) -> StoreResult<Option<Actor>>;

    /// Look up an actor with its follower IRIs preloaded.
    async fn get_by_username_with_followers(&self, username: &str) -> StoreResult<Option<Actor>>;

    /// Apply a federated profile update and return the updated actor.
    ///
    /// Fails with [`StoreError::NotFound`](crate::StoreError::NotFound) if
    /// the account does not exist.
    async fn update_profile(&self, username: &str, update: &ProfileUpdate) -> StoreResult<Actor>;
}

/// Membership records for one kind of ordered collection.
///
/// The adapter holds one repository per collection kind. Implementations
/// must enforce uniqueness on `(collection, item)` and must never update or
/// delete a record.
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// All records of a collection, newest first.
    ///
    /// Records sharing a timestamp are returned in reverse insertion order.
    async fn get_by_collection(&self, collection: &Iri) -> StoreResult<Vec<MembershipRecord>>;

    /// Whether `item` is a member of `collection`.
    async fn contains_member(&self, collection: &Iri, item: &Iri) -> StoreResult<bool>;

    /// Persist a new record.
    ///
    /// Fails with [`StoreError::Duplicate`](crate::StoreError::Duplicate) if
    /// the pair is already present.
    async fn create_member(&self, record: &MembershipRecord) -> StoreResult<()>;
}

/// Persisted read activities, keyed by their IRI.
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Returns `Ok(None)` if no activity has this id.
    async fn get_by_id(&self, id: &Iri) -> StoreResult<Option<ReadActivity>>;

    /// Whether an activity with this id exists.
    ///
    /// Default implementation calls `get_by_id()`. Backends may override
    /// with a cheaper lookup.
    async fn exists(&self, id: &Iri) -> StoreResult<bool> {
        Ok(self.get_by_id(id).await?.is_some())
    }

    /// Persist a new activity. Fails with `Duplicate` if the id is taken.
    async fn create(&self, activity: &ReadActivity) -> StoreResult<()>;

    /// Replace an existing activity. Fails with `NotFound` if absent.
    async fn update(&self, activity: &ReadActivity) -> StoreResult<()>;

    /// Delete by id. Returns `true` if the activity existed.
    async fn delete(&self, id: &Iri) -> StoreResult<bool>;
}

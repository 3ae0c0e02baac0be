//! In-memory repositories for tests and embedding.
//!
//! Every backend keeps its data in a `HashMap` behind a `RwLock`. Guards are
//! never held across an `.await`, so the async trait methods complete without
//! yielding. Data is lost when the repository is dropped.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use exlibris_types::{Actor, Iri, MembershipRecord, ProfileUpdate, ReadActivity};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ActivityRepository, IdentityStore, MembershipRepository};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// In-memory [`IdentityStore`] with follower lists kept beside the accounts.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    actors: RwLock<HashMap<String, Actor>>,
    followers: RwLock<HashMap<String, Vec<Iri>>>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account, replacing any account with the same username.
    pub fn insert(&self, mut actor: Actor) -> StoreResult<()> {
        actor.followers.clear();
        self.actors.write()?.insert(actor.username.clone(), actor);
        Ok(())
    }

    /// Record that `follower` follows `username`. Adding a follower twice
    /// is a no-op.
    pub fn add_follower(&self, username: &str, follower: Iri) -> StoreResult<()> {
        if !self.actors.read()?.contains_key(username) {
            return Err(StoreError::NotFound(format!("actor {username}")));
        }
        let mut followers = self.followers.write()?;
        let list = followers.entry(username.to_string()).or_default();
        if !list.contains(&follower) {
            list.push(follower);
        }
        Ok(())
    }

    /// Number of registered accounts.
    pub fn len(&self) -> usize {
        self.actors.read().map(|a| a.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn get_by_username(&self, username: &str) -> StoreResult<Option<Actor>> {
        Ok(self.actors.read()?.get(username).cloned())
    }

    async fn get_by_username_with_followers(&self, username: &str) -> StoreResult<Option<Actor>> {
        let Some(mut actor) = self.actors.read()?.get(username).cloned() else {
            return Ok(None);
        };
        actor.followers = self
            .followers
            .read()?
            .get(username)
            .cloned()
            .unwrap_or_default();
        Ok(Some(actor))
    }

    async fn update_profile(&self, username: &str, update: &ProfileUpdate) -> StoreResult<Actor> {
        let mut actors = self.actors.write()?;
        let actor = actors
            .get_mut(username)
            .ok_or_else(|| StoreError::NotFound(format!("actor {username}")))?;
        actor.apply(update);
        Ok(actor.clone())
    }
}

// ---------------------------------------------------------------------------
// Membership
// ---------------------------------------------------------------------------

/// In-memory [`MembershipRepository`].
///
/// Records are grouped by collection IRI and kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMembershipRepository {
    collections: RwLock<HashMap<Iri, Vec<MembershipRecord>>>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total records across all collections.
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn get_by_collection(&self, collection: &Iri) -> StoreResult<Vec<MembershipRecord>> {
        let mut records: Vec<MembershipRecord> = self
            .collections
            .read()?
            .get(collection)
            .map(|list| list.iter().rev().cloned().collect())
            .unwrap_or_default();
        // Stable sort keeps reverse insertion order among equal timestamps.
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn contains_member(&self, collection: &Iri, item: &Iri) -> StoreResult<bool> {
        Ok(self
            .collections
            .read()?
            .get(collection)
            .is_some_and(|list| list.iter().any(|r| &r.item == item)))
    }

    async fn create_member(&self, record: &MembershipRecord) -> StoreResult<()> {
        let mut collections = self.collections.write()?;
        let list = collections.entry(record.collection.clone()).or_default();
        if list.iter().any(|r| r.item == record.item) {
            return Err(StoreError::Duplicate(format!(
                "{} in {}",
                record.item, record.collection
            )));
        }
        list.push(record.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

/// In-memory [`ActivityRepository`].
#[derive(Debug, Default)]
pub struct InMemoryActivityRepository {
    activities: RwLock<HashMap<Iri, ReadActivity>>,
}

impl InMemoryActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.activities.read().map(|a| a.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn get_by_id(&self, id: &Iri) -> StoreResult<Option<ReadActivity>> {
        Ok(self.activities.read()?.get(id).cloned())
    }

    async fn exists(&self, id: &Iri) -> StoreResult<bool> {
        Ok(self.activities.read()?.contains_key(id))
    }

    async fn create(&self, activity: &ReadActivity) -> StoreResult<()> {
        let mut activities = self.activities.write()?;
        if activities.contains_key(&activity.id) {
            return Err(StoreError::Duplicate(activity.id.to_string()));
        }
        activities.insert(activity.id.clone(), activity.clone());
        Ok(())
    }

    async fn update(&self, activity: &ReadActivity) -> StoreResult<()> {
        let mut activities = self.activities.write()?;
        let slot = activities
            .get_mut(&activity.id)
            .ok_or_else(|| StoreError::NotFound(activity.id.to_string()))?;
        *slot = activity.clone();
        Ok(())
    }

    async fn delete(&self, id: &Iri) -> StoreResult<bool> {
        Ok(self.activities.write()?.remove(id).is_some())
    }
}

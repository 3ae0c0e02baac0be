//! Shared fixtures for the unit tests in this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use exlibris_store::{
    ActivityRepository, IdentityStore, InMemoryActivityRepository, InMemoryIdentityStore,
    InMemoryMembershipRepository, MembershipRepository, StoreError, StoreResult,
};
use exlibris_types::{Actor, Book, Iri, MembershipRecord, ProfileUpdate, ReadActivity};

use crate::clock::ManualClock;
use crate::config::FederationConfig;

pub fn iri(s: &str) -> Iri {
    Iri::parse(s).unwrap()
}

pub fn config() -> FederationConfig {
    FederationConfig::new("https", "example.test").unwrap()
}

pub fn actor(username: &str) -> Actor {
    Actor::new(
        iri(&format!("https://example.test/user/{username}")),
        username,
        username.to_uppercase(),
    )
    .unwrap()
}

pub fn read_activity(id: &str) -> ReadActivity {
    ReadActivity::new(
        iri(id),
        iri("https://example.test/user/alice"),
        Book::open_library("OL893415W", "Dune").unwrap().published(1965),
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
    )
}

/// In-memory backends with `alice` registered.
pub struct Fixture {
    pub identities: Arc<InMemoryIdentityStore>,
    pub inboxes: Arc<InMemoryMembershipRepository>,
    pub outboxes: Arc<InMemoryMembershipRepository>,
    pub activities: Arc<InMemoryActivityRepository>,
    pub clock: Arc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let identities = Arc::new(InMemoryIdentityStore::new());
        identities.insert(actor("alice")).unwrap();
        Self {
            identities,
            inboxes: Arc::new(InMemoryMembershipRepository::new()),
            outboxes: Arc::new(InMemoryMembershipRepository::new()),
            activities: Arc::new(InMemoryActivityRepository::new()),
            clock: Arc::new(ManualClock::new(
                Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            )),
        }
    }
}

/// A backend whose every call fails as if the database were down.
#[derive(Debug, Default)]
pub struct Unavailable;

fn down<T>() -> StoreResult<T> {
    Err(StoreError::Unavailable("connection refused".into()))
}

#[async_trait]
impl IdentityStore for Unavailable {
    async fn get_by_username(&self, _: &str) -> StoreResult<Option<Actor>> {
        down()
    }

    async fn get_by_username_with_followers(&self, _: &str) -> StoreResult<Option<Actor>> {
        down()
    }

    async fn update_profile(&self, _: &str, _: &ProfileUpdate) -> StoreResult<Actor> {
        down()
    }
}

#[async_trait]
impl MembershipRepository for Unavailable {
    async fn get_by_collection(&self, _: &Iri) -> StoreResult<Vec<MembershipRecord>> {
        down()
    }

    async fn contains_member(&self, _: &Iri, _: &Iri) -> StoreResult<bool> {
        down()
    }

    async fn create_member(&self, _: &MembershipRecord) -> StoreResult<()> {
        down()
    }
}

#[async_trait]
impl ActivityRepository for Unavailable {
    async fn get_by_id(&self, _: &Iri) -> StoreResult<Option<ReadActivity>> {
        down()
    }

    async fn create(&self, _: &ReadActivity) -> StoreResult<()> {
        down()
    }

    async fn update(&self, _: &ReadActivity) -> StoreResult<()> {
        down()
    }

    async fn delete(&self, _: &Iri) -> StoreResult<bool> {
        down()
    }
}

/// Membership storage whose reads always work but which accepts only a
/// fixed number of writes before failing like [`Unavailable`].
#[derive(Debug)]
pub struct WritesFailAfter {
    pub inner: Arc<InMemoryMembershipRepository>,
    writes_left: AtomicUsize,
}

impl WritesFailAfter {
    pub fn new(inner: Arc<InMemoryMembershipRepository>, writes: usize) -> Self {
        Self {
            inner,
            writes_left: AtomicUsize::new(writes),
        }
    }
}

#[async_trait]
impl MembershipRepository for WritesFailAfter {
    async fn get_by_collection(&self, collection: &Iri) -> StoreResult<Vec<MembershipRecord>> {
        self.inner.get_by_collection(collection).await
    }

    async fn contains_member(&self, collection: &Iri, item: &Iri) -> StoreResult<bool> {
        self.inner.contains_member(collection, item).await
    }

    async fn create_member(&self, record: &MembershipRecord) -> StoreResult<()> {
        let allowed = self
            .writes_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if allowed {
            self.inner.create_member(record).await
        } else {
            down()
        }
    }
}

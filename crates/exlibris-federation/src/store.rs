use std::sync::Arc;

use async_trait::async_trait;
use exlibris_store::{
    ActivityRepository, IdentityStore, InMemoryActivityRepository, InMemoryMembershipRepository,
    MembershipRepository,
};
use exlibris_types::{CollectionKind, Iri};
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::collection::CollectionSynchronizer;
use crate::config::FederationConfig;
use crate::error::Result;
use crate::id::{AuthenticatedActor, IdGenerator};
use crate::lock::LockManager;
use crate::materializer::ObjectMaterializer;
use crate::resolver::{collection_owner, profile_iri, ResourceRef};
use crate::traits::FederationDatabase;
use crate::vocab::{Collection, FederatedObject, OrderedCollectionPage};

/// The backends a [`FederationStore`] is assembled from.
#[derive(Clone)]
pub struct Repositories {
    pub identities: Arc<dyn IdentityStore>,
    pub inboxes: Arc<dyn MembershipRepository>,
    pub outboxes: Arc<dyn MembershipRepository>,
    pub activities: Arc<dyn ActivityRepository>,
    pub clock: Arc<dyn Clock>,
}

impl Repositories {
    /// In-memory membership and activity storage on the system clock, with
    /// accounts from `identities`.
    pub fn in_memory(identities: Arc<dyn IdentityStore>) -> Self {
        Self {
            identities,
            inboxes: Arc::new(InMemoryMembershipRepository::new()),
            outboxes: Arc::new(InMemoryMembershipRepository::new()),
            activities: Arc::new(InMemoryActivityRepository::new()),
            clock: Arc::new(SystemClock),
        }
    }
}

/// [`FederationDatabase`] built from the lock manager, the two collection
/// synchronizers, the object materializer and the id generator.
pub struct FederationStore {
    config: FederationConfig,
    locks: LockManager,
    inbox: CollectionSynchronizer,
    outbox: CollectionSynchronizer,
    objects: ObjectMaterializer,
    ids: IdGenerator,
}

impl FederationStore {
    pub fn new(config: FederationConfig, repos: Repositories) -> Self {
        info!(base = %config.base_url(), "federation store ready");
        let Repositories {
            identities,
            inboxes,
            outboxes,
            activities,
            clock,
        } = repos;
        Self {
            locks: LockManager::new(),
            inbox: CollectionSynchronizer::new(
                CollectionKind::Inbox,
                inboxes,
                Arc::clone(&identities),
                Arc::clone(&clock),
            ),
            outbox: CollectionSynchronizer::new(
                CollectionKind::Outbox,
                outboxes,
                Arc::clone(&identities),
                Arc::clone(&clock),
            ),
            objects: ObjectMaterializer::new(config.clone(), identities, activities, clock),
            ids: IdGenerator::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Lock table diagnostics.
    pub fn locks(&self) -> &LockManager {
        &self.locks
    }
}

impl std::fmt::Debug for FederationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FederationStore")
            .field("config", &self.config)
            .field("locks", &self.locks)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl FederationDatabase for FederationStore {
    async fn lock(&self, iri: &Iri) -> Result<()> {
        self.locks.lock(iri).await;
        Ok(())
    }

    async fn unlock(&self, iri: &Iri) -> Result<()> {
        self.locks.unlock(iri)
    }

    async fn inbox_contains(&self, inbox: &Iri, item: &Iri) -> Result<bool> {
        self.inbox.contains(inbox, item).await
    }

    async fn get_inbox(&self, inbox: &Iri) -> Result<OrderedCollectionPage> {
        self.inbox.get_page(inbox).await
    }

    async fn set_inbox(&self, page: &OrderedCollectionPage) -> Result<()> {
        self.inbox.set_page(page).await.map(|_| ())
    }

    async fn owns(&self, iri: &Iri) -> Result<bool> {
        Ok(self.objects.owns(iri))
    }

    async fn actor_for_outbox(&self, outbox: &Iri) -> Result<Iri> {
        let username = collection_owner(outbox, CollectionKind::Outbox)?;
        Ok(profile_iri(&self.config, &username)?)
    }

    async fn actor_for_inbox(&self, inbox: &Iri) -> Result<Iri> {
        let username = collection_owner(inbox, CollectionKind::Inbox)?;
        Ok(profile_iri(&self.config, &username)?)
    }

    async fn outbox_for_inbox(&self, inbox: &Iri) -> Result<Iri> {
        let username = collection_owner(inbox, CollectionKind::Inbox)?;
        Ok(ResourceRef::OutboxPage { username }.to_iri(&self.config)?)
    }

    async fn exists(&self, iri: &Iri) -> Result<bool> {
        self.objects.exists(iri).await
    }

    async fn get(&self, iri: &Iri) -> Result<FederatedObject> {
        self.objects.get(iri).await
    }

    async fn create(&self, object: &FederatedObject) -> Result<()> {
        self.objects.create(object).await
    }

    async fn update(&self, object: &FederatedObject) -> Result<()> {
        self.objects.update(object).await
    }

    async fn delete(&self, iri: &Iri) -> Result<()> {
        self.objects.delete(iri).await
    }

    async fn get_outbox(&self, outbox: &Iri) -> Result<OrderedCollectionPage> {
        self.outbox.get_page(outbox).await
    }

    async fn set_outbox(&self, page: &OrderedCollectionPage) -> Result<()> {
        let written = self.outbox.set_page(page).await?;
        debug!(outbox = %page.id, written, "outbox set");
        Ok(())
    }

    async fn new_id(
        &self,
        actor: Option<&AuthenticatedActor>,
        hint: &FederatedObject,
    ) -> Result<Iri> {
        self.ids.new_id(actor, hint)
    }

    async fn followers(&self, actor: &Iri) -> Result<Collection> {
        self.objects.followers(actor).await
    }

    async fn following(&self, actor: &Iri) -> Result<Collection> {
        self.objects.following(actor).await
    }

    async fn liked(&self, actor: &Iri) -> Result<Collection> {
        self.objects.liked(actor).await
    }
}

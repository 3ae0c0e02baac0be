use async_trait::async_trait;
use exlibris_types::Iri;

use crate::error::Result;
use crate::id::AuthenticatedActor;
use crate::vocab::{Collection, FederatedObject, OrderedCollectionPage};

/// The storage contract a federation protocol engine drives.
///
/// Callers bracket every call that reads or mutates a resource with
/// [`lock`](Self::lock) and [`unlock`](Self::unlock) on that resource's IRI.
/// Implementations never lock on their own behalf.
#[async_trait]
pub trait FederationDatabase: Send + Sync {
    /// Take exclusive access to `iri`. On error the lock was not taken.
    async fn lock(&self, iri: &Iri) -> Result<()>;
    /// Release `iri`. Fails if it is not locked.
    async fn unlock(&self, iri: &Iri) -> Result<()>;

    async fn inbox_contains(&self, inbox: &Iri, item: &Iri) -> Result<bool>;
    async fn get_inbox(&self, inbox: &Iri) -> Result<OrderedCollectionPage>;
    async fn set_inbox(&self, page: &OrderedCollectionPage) -> Result<()>;

    /// Whether this deployment hosts `iri`.
    async fn owns(&self, iri: &Iri) -> Result<bool>;
    async fn actor_for_outbox(&self, outbox: &Iri) -> Result<Iri>;
    async fn actor_for_inbox(&self, inbox: &Iri) -> Result<Iri>;
    async fn outbox_for_inbox(&self, inbox: &Iri) -> Result<Iri>;

    async fn exists(&self, iri: &Iri) -> Result<bool>;
    async fn get(&self, iri: &Iri) -> Result<FederatedObject>;
    async fn create(&self, object: &FederatedObject) -> Result<()>;
    async fn update(&self, object: &FederatedObject) -> Result<()>;
    async fn delete(&self, iri: &Iri) -> Result<()>;

    async fn get_outbox(&self, outbox: &Iri) -> Result<OrderedCollectionPage>;
    async fn set_outbox(&self, page: &OrderedCollectionPage) -> Result<()>;

    /// A fresh id for `hint`, created by `actor`.
    async fn new_id(
        &self,
        actor: Option<&AuthenticatedActor>,
        hint: &FederatedObject,
    ) -> Result<Iri>;

    async fn followers(&self, actor: &Iri) -> Result<Collection>;
    async fn following(&self, actor: &Iri) -> Result<Collection>;
    async fn liked(&self, actor: &Iri) -> Result<Collection>;
}

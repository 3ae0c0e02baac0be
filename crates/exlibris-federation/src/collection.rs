use std::collections::HashSet;
use std::sync::Arc;

use exlibris_store::{IdentityStore, MembershipRepository};
use exlibris_types::{CollectionKind, Iri, MembershipRecord};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{FederationError, Result};
use crate::resolver::collection_owner;
use crate::vocab::OrderedCollectionPage;

/// Reconciles inbox or outbox snapshots against persisted membership.
///
/// Merging only ever adds: items missing from an incoming page are kept, and
/// items already present are not rewritten. Callers hold the collection's
/// lock for the duration of a call; the synchronizer takes none itself.
pub struct CollectionSynchronizer {
    kind: CollectionKind,
    members: Arc<dyn MembershipRepository>,
    identities: Arc<dyn IdentityStore>,
    clock: Arc<dyn Clock>,
}

impl CollectionSynchronizer {
    pub fn new(
        kind: CollectionKind,
        members: Arc<dyn MembershipRepository>,
        identities: Arc<dyn IdentityStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            kind,
            members,
            identities,
            clock,
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// The owning username, if `iri` addresses a collection of this kind.
    fn owner_of(&self, iri: &Iri) -> Result<String> {
        collection_owner(iri, self.kind)
    }

    /// The current contents of the collection at `iri`, newest first.
    pub async fn get_page(&self, iri: &Iri) -> Result<OrderedCollectionPage> {
        self.owner_of(iri)?;
        let records = self.members.get_by_collection(iri).await.map_err(|e| {
            warn!(%iri, error = %e, "loading collection failed");
            e
        })?;
        debug!(%iri, kind = %self.kind, items = records.len(), "collection loaded");
        Ok(OrderedCollectionPage::new(
            iri.clone(),
            records.into_iter().map(|r| r.item).collect(),
        ))
    }

    /// Merge `page` into the persisted collection and return how many
    /// records were written.
    ///
    /// Items are written oldest first so that the first item of the page
    /// ends up as the newest record.
    pub async fn set_page(&self, page: &OrderedCollectionPage) -> Result<usize> {
        let iri = &page.id;
        let owner = self.owner_of(iri)?;
        if self.identities.get_by_username(&owner).await?.is_none() {
            return Err(FederationError::UnknownActor(owner));
        }
        if page.is_empty() {
            return Ok(0);
        }

        let mut present: HashSet<Iri> = self
            .members
            .get_by_collection(iri)
            .await?
            .into_iter()
            .map(|r| r.item)
            .collect();

        let mut written = 0;
        for item in page.ordered_items.iter().rev() {
            if !present.insert(item.clone()) {
                continue;
            }
            let record = MembershipRecord::new(
                self.kind,
                iri.clone(),
                item.clone(),
                owner.as_str(),
                self.clock.now(),
            );
            if let Err(e) = self.members.create_member(&record).await {
                warn!(%iri, %item, error = %e, "writing membership failed");
                return Err(e.into());
            }
            written += 1;
        }
        debug!(%iri, kind = %self.kind, written, "collection synchronized");
        Ok(written)
    }

    /// Whether `item` is a member of the collection at `collection`.
    pub async fn contains(&self, collection: &Iri, item: &Iri) -> Result<bool> {
        self.owner_of(collection)?;
        Ok(self.members.contains_member(collection, item).await?)
    }
}

impl std::fmt::Debug for CollectionSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSynchronizer")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

use std::sync::Arc;

use exlibris_store::{ActivityRepository, IdentityStore, StoreError};
use exlibris_types::{Actor, Iri};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::FederationConfig;
use crate::error::{FederationError, Result};
use crate::resolver::{following_iri, liked_iri, profile_iri, resolve, ResourceRef};
use crate::vocab::{Collection, FederatedObject, Person, Read, PUBLIC_COLLECTION};

/// Converts stored users and reads to and from their protocol form.
pub struct ObjectMaterializer {
    config: FederationConfig,
    identities: Arc<dyn IdentityStore>,
    activities: Arc<dyn ActivityRepository>,
    clock: Arc<dyn Clock>,
}

impl ObjectMaterializer {
    pub fn new(
        config: FederationConfig,
        identities: Arc<dyn IdentityStore>,
        activities: Arc<dyn ActivityRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            identities,
            activities,
            clock,
        }
    }

    pub fn config(&self) -> &FederationConfig {
        &self.config
    }

    /// Whether `iri` is hosted by this deployment: same scheme and
    /// authority as the configured base. Storage is not consulted.
    pub fn owns(&self, iri: &Iri) -> bool {
        self.config.owns(iri)
    }

    /// Resolve `iri` as an account-backed resource on this deployment.
    /// Reads are keyed by their full IRI and are left to the caller.
    fn local_account_resource(&self, iri: &Iri) -> Option<ResourceRef> {
        resolve(iri).filter(|r| {
            matches!(r, ResourceRef::ReadActivity { .. }) || self.config.owns(iri)
        })
    }

    /// Whether the resource at `iri` exists. Unrecognized IRIs, and
    /// account-backed IRIs on another host, do not.
    pub async fn exists(&self, iri: &Iri) -> Result<bool> {
        let exists = match self.local_account_resource(iri) {
            Some(ResourceRef::ReadActivity { .. }) => self.activities.exists(iri).await?,
            Some(r) => self.identities.get_by_username(r.username()).await?.is_some(),
            None => false,
        };
        debug!(%iri, exists, "exists");
        Ok(exists)
    }

    /// The protocol form of the resource at `iri`.
    pub async fn get(&self, iri: &Iri) -> Result<FederatedObject> {
        let resource = self
            .local_account_resource(iri)
            .ok_or_else(|| FederationError::UnsupportedResource(iri.clone()))?;
        debug!(%iri, resource = %resource, "get");
        match resource {
            ResourceRef::ReadActivity { username, .. } => {
                let activity = self
                    .activities
                    .get_by_id(iri)
                    .await?
                    .ok_or_else(|| FederationError::NotFound(iri.clone()))?;
                let actor = profile_iri(&self.config, &username)?;
                let to = vec![
                    ResourceRef::Followers { username }.to_iri(&self.config)?,
                    Iri::parse(PUBLIC_COLLECTION)?,
                ];
                Ok(Read::from_activity(&activity, actor, to).into())
            }
            ResourceRef::Followers { username } => {
                let actor = self
                    .identities
                    .get_by_username_with_followers(&username)
                    .await?
                    .ok_or_else(|| FederationError::NotFound(iri.clone()))?;
                Ok(Collection::new(iri.clone(), actor.followers).into())
            }
            ResourceRef::Profile { username } => {
                let actor = self
                    .identities
                    .get_by_username(&username)
                    .await?
                    .ok_or_else(|| FederationError::NotFound(iri.clone()))?;
                Ok(self.person(&actor)?.into())
            }
            ResourceRef::InboxPage { .. } | ResourceRef::OutboxPage { .. } => {
                Err(FederationError::UnsupportedResource(iri.clone()))
            }
        }
    }

    /// Render an account as a `Person`.
    pub fn person(&self, actor: &Actor) -> Result<Person> {
        let username = actor.username.clone();
        let iri_of = |r: ResourceRef| r.to_iri(&self.config);
        Ok(Person {
            id: actor.id.clone(),
            name: Some(actor.display_name.clone()),
            preferred_username: Some(username.clone()),
            summary: (!actor.summary.is_empty()).then(|| actor.summary.clone()),
            url: Some(actor.id.clone()),
            inbox: Some(iri_of(ResourceRef::InboxPage {
                username: username.clone(),
            })?),
            outbox: Some(iri_of(ResourceRef::OutboxPage {
                username: username.clone(),
            })?),
            followers: Some(iri_of(ResourceRef::Followers {
                username: username.clone(),
            })?),
            following: Some(following_iri(&self.config, &username)?),
            liked: Some(liked_iri(&self.config, &username)?),
        })
    }

    /// Persist a new object. Creating an object that already exists succeeds
    /// without writing, so redelivery is harmless.
    pub async fn create(&self, object: &FederatedObject) -> Result<()> {
        if let Some(id) = object.id() {
            if self.exists(id).await? {
                debug!(%id, kind = object.kind(), "create of existing object ignored");
                return Ok(());
            }
        }
        match object {
            FederatedObject::Read(read) => {
                let activity = read.clone().into_activity(self.clock.now());
                match self.activities.create(&activity).await {
                    Ok(()) | Err(StoreError::Duplicate(_)) => {
                        debug!(id = %activity.id, "read created");
                        Ok(())
                    }
                    Err(e) => {
                        warn!(id = %activity.id, error = %e, "storing read failed");
                        Err(e.into())
                    }
                }
            }
            other => {
                warn!(kind = other.kind(), "create rejected");
                Err(FederationError::UnsupportedActivityType(
                    other.kind().to_string(),
                ))
            }
        }
    }

    /// Replace an existing object.
    pub async fn update(&self, object: &FederatedObject) -> Result<()> {
        match object {
            FederatedObject::Read(read) => {
                let activity = read.clone().into_activity(self.clock.now());
                match self.activities.update(&activity).await {
                    Ok(()) => {
                        debug!(id = %activity.id, "read updated");
                        Ok(())
                    }
                    Err(StoreError::NotFound(_)) => Err(FederationError::NotFound(activity.id)),
                    Err(e) => {
                        warn!(id = %activity.id, error = %e, "updating read failed");
                        Err(e.into())
                    }
                }
            }
            FederatedObject::Person(person) => {
                let username = match self.local_account_resource(&person.id) {
                    Some(ResourceRef::Profile { username }) => username,
                    _ => return Err(FederationError::UnsupportedResource(person.id.clone())),
                };
                match self
                    .identities
                    .update_profile(&username, &person.profile_update())
                    .await
                {
                    Ok(_) => {
                        debug!(id = %person.id, "profile updated");
                        Ok(())
                    }
                    Err(StoreError::NotFound(_)) => Err(FederationError::UnknownActor(username)),
                    Err(e) => {
                        warn!(id = %person.id, error = %e, "updating profile failed");
                        Err(e.into())
                    }
                }
            }
            other => {
                warn!(kind = other.kind(), "update rejected");
                Err(FederationError::UnsupportedActivityType(
                    other.kind().to_string(),
                ))
            }
        }
    }

    /// Remove the object at `iri`. Deleting an absent read succeeds.
    pub async fn delete(&self, iri: &Iri) -> Result<()> {
        match resolve(iri) {
            Some(ResourceRef::ReadActivity { .. }) => {
                let removed = self.activities.delete(iri).await?;
                debug!(%iri, removed, "read deleted");
                Ok(())
            }
            Some(other) => {
                warn!(%iri, kind = other.kind_name(), "delete rejected");
                Err(FederationError::UnsupportedActivityType(
                    other.kind_name().to_string(),
                ))
            }
            None => Err(FederationError::UnsupportedResource(iri.clone())),
        }
    }

    // -----------------------------------------------------------------------
    // Actor collections
    // -----------------------------------------------------------------------

    fn profile_owner(&self, actor: &Iri) -> Result<String> {
        match self.local_account_resource(actor) {
            Some(ResourceRef::Profile { username }) => Ok(username),
            _ => Err(FederationError::ResourceNotRecognized {
                iri: actor.clone(),
                expected: "profile",
            }),
        }
    }

    async fn require_actor(&self, username: &str) -> Result<()> {
        match self.identities.get_by_username(username).await? {
            Some(_) => Ok(()),
            None => Err(FederationError::UnknownActor(username.to_string())),
        }
    }

    /// The followers of the actor whose profile is `actor`.
    pub async fn followers(&self, actor: &Iri) -> Result<Collection> {
        let username = self.profile_owner(actor)?;
        let found = self
            .identities
            .get_by_username_with_followers(&username)
            .await?
            .ok_or_else(|| FederationError::UnknownActor(username.clone()))?;
        let id = ResourceRef::Followers { username }.to_iri(&self.config)?;
        Ok(Collection::new(id, found.followers))
    }

    /// Actors `actor` follows. Not recorded here, so always empty.
    pub async fn following(&self, actor: &Iri) -> Result<Collection> {
        let username = self.profile_owner(actor)?;
        self.require_actor(&username).await?;
        Ok(Collection::empty(following_iri(&self.config, &username)?))
    }

    /// Objects `actor` liked. Not recorded here, so always empty.
    pub async fn liked(&self, actor: &Iri) -> Result<Collection> {
        let username = self.profile_owner(actor)?;
        self.require_actor(&username).await?;
        Ok(Collection::empty(liked_iri(&self.config, &username)?))
    }
}

impl std::fmt::Debug for ObjectMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectMaterializer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{config, iri, read_activity, Fixture, Unavailable};
    use crate::vocab::Document;

    fn materializer(fx: &Fixture) -> ObjectMaterializer {
        ObjectMaterializer::new(
            config(),
            fx.identities.clone(),
            fx.activities.clone(),
            fx.clock.clone(),
        )
    }

    const READ: &str = "https://example.test/user/alice/read/0b1e";

    fn read_object(id: &str) -> FederatedObject {
        let activity = read_activity(id);
        FederatedObject::Read(Read::from_activity(
            &activity,
            activity.actor.clone(),
            Vec::new(),
        ))
    }

    // -----------------------------------------------------------------------
    // owns / exists
    // -----------------------------------------------------------------------

    #[test]
    fn owns_compares_scheme_and_authority() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        assert!(m.owns(&iri("https://example.test/anything?x=1")));
        assert!(m.owns(&iri("https://EXAMPLE.test/user/alice")));
        assert!(!m.owns(&iri("http://example.test/user/alice")));
        assert!(!m.owns(&iri("https://example.test:8443/user/alice")));
        assert!(!m.owns(&iri("https://remote.test/user/alice")));
    }

    #[test]
    fn owns_with_explicit_port() {
        let fx = Fixture::new();
        let m = ObjectMaterializer::new(
            FederationConfig::new("http", "localhost:8080").unwrap(),
            fx.identities.clone(),
            fx.activities.clone(),
            fx.clock.clone(),
        );
        assert!(m.owns(&iri("http://localhost:8080/user/alice")));
        assert!(!m.owns(&iri("http://localhost/user/alice")));
    }

    #[tokio::test]
    async fn exists_by_kind() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        assert!(m.exists(&iri("https://example.test/user/alice")).await.unwrap());
        assert!(m.exists(&iri("https://example.test/user/alice/inbox")).await.unwrap());
        assert!(m.exists(&iri("https://example.test/user/alice/followers")).await.unwrap());
        assert!(!m.exists(&iri("https://example.test/user/bob")).await.unwrap());
        assert!(!m.exists(&iri(READ)).await.unwrap());
        assert!(!m.exists(&iri("https://example.test/books/1")).await.unwrap());

        m.create(&read_object(READ)).await.unwrap();
        assert!(m.exists(&iri(READ)).await.unwrap());
    }

    #[tokio::test]
    async fn remote_host_is_not_a_local_account() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        for s in [
            "https://remote.test/user/alice",
            "https://remote.test/user/alice/followers",
            "https://remote.test/user/alice/inbox",
            "http://example.test/user/alice",
        ] {
            assert!(!m.exists(&iri(s)).await.unwrap(), "{s}");
            let err = m.get(&iri(s)).await.unwrap_err();
            assert!(matches!(err, FederationError::UnsupportedResource(_)), "{s}");
        }
    }

    #[tokio::test]
    async fn exists_propagates_storage_failure() {
        let fx = Fixture::new();
        let m = ObjectMaterializer::new(
            config(),
            Arc::new(Unavailable),
            fx.activities.clone(),
            fx.clock.clone(),
        );
        let err = m.exists(&iri("https://example.test/user/alice")).await.unwrap_err();
        assert!(matches!(err, FederationError::StorageUnavailable(_)));
        // Unrecognized IRIs never touch storage.
        assert!(!m.exists(&iri("https://example.test/about")).await.unwrap());
    }

    // -----------------------------------------------------------------------
    // get
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn get_read_renders_addressing() {
        let fx = Fixture::new();
        fx.activities.create(&read_activity(READ)).await.unwrap();
        let m = materializer(&fx);

        let FederatedObject::Read(read) = m.get(&iri(READ)).await.unwrap() else {
            panic!("expected a Read");
        };
        assert_eq!(read.actor, iri("https://example.test/user/alice"));
        assert_eq!(
            read.to,
            vec![
                iri("https://example.test/user/alice/followers"),
                iri(PUBLIC_COLLECTION)
            ]
        );
        assert_eq!(read.object.name, "Dune");
        assert_eq!(
            read.object.id,
            iri("https://openlibrary.org/works/OL893415W/")
        );
    }

    #[tokio::test]
    async fn get_missing_read() {
        let fx = Fixture::new();
        let err = materializer(&fx).get(&iri(READ)).await.unwrap_err();
        assert!(matches!(err, FederationError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_profile() {
        let fx = Fixture::new();
        let FederatedObject::Person(p) = materializer(&fx)
            .get(&iri("https://example.test/user/alice"))
            .await
            .unwrap()
        else {
            panic!("expected a Person");
        };
        assert_eq!(p.preferred_username.as_deref(), Some("alice"));
        assert_eq!(p.name.as_deref(), Some("ALICE"));
        assert_eq!(p.summary, None);
        assert_eq!(
            p.inbox.unwrap().as_str(),
            "https://example.test/user/alice/inbox"
        );
        assert_eq!(
            p.liked.unwrap().as_str(),
            "https://example.test/user/alice/liked"
        );
    }

    #[tokio::test]
    async fn get_followers() {
        let fx = Fixture::new();
        fx.identities
            .add_follower("alice", iri("https://remote.test/user/bob"))
            .unwrap();
        let followers = iri("https://example.test/user/alice/followers");
        let FederatedObject::Collection(c) = materializer(&fx).get(&followers).await.unwrap()
        else {
            panic!("expected a Collection");
        };
        assert_eq!(c.id, followers);
        assert_eq!(c.items, vec![iri("https://remote.test/user/bob")]);
        assert_eq!(c.total_items, 1);
    }

    #[tokio::test]
    async fn get_unsupported() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        for s in [
            "https://example.test/user/alice/inbox",
            "https://example.test/user/alice/outbox",
            "https://example.test/static/logo.png",
        ] {
            let err = m.get(&iri(s)).await.unwrap_err();
            assert!(matches!(err, FederationError::UnsupportedResource(_)), "{s}");
        }
    }

    // -----------------------------------------------------------------------
    // create / update / delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_is_idempotent() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        m.create(&read_object(READ)).await.unwrap();
        m.create(&read_object(READ)).await.unwrap();
        assert_eq!(fx.activities.len(), 1);
    }

    #[tokio::test]
    async fn create_rejects_other_kinds() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let like = FederatedObject::Unknown {
            kind: "Like".into(),
            id: Some(iri("https://remote.test/likes/1")),
        };
        let err = m.create(&like).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedActivityType(ref k) if k == "Like"));

        let page = FederatedObject::Unknown {
            kind: "OrderedCollectionPage".into(),
            id: None,
        };
        assert!(m.create(&page).await.is_err());
        assert!(fx.activities.is_empty());
    }

    #[tokio::test]
    async fn create_remote_person_fails_loudly() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let remote = Person::new(iri("https://remote.test/user/alice"));
        let err = m.create(&remote.into()).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedActivityType(ref k) if k == "Person"));
        assert!(fx.activities.is_empty());
    }

    #[tokio::test]
    async fn create_read_without_published_uses_clock() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let read = Read {
            id: iri(READ),
            actor: iri("https://example.test/user/alice"),
            object: Document {
                id: iri("https://openlibrary.org/works/OL1W/"),
                name: "Emma".into(),
                published: None,
                attributed_to: Vec::new(),
            },
            to: Vec::new(),
            published: None,
        };
        m.create(&read.into()).await.unwrap();
        let stored = fx.activities.get_by_id(&iri(READ)).await.unwrap().unwrap();
        assert_eq!(stored.published, fx.clock.now());
    }

    #[tokio::test]
    async fn update_read() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        m.create(&read_object(READ)).await.unwrap();

        let FederatedObject::Read(mut read) = read_object(READ) else {
            unreachable!()
        };
        read.object.name = "Dune Messiah".into();
        m.update(&read.into()).await.unwrap();
        let stored = fx.activities.get_by_id(&iri(READ)).await.unwrap().unwrap();
        assert_eq!(stored.book.title, "Dune Messiah");
    }

    #[tokio::test]
    async fn update_missing_read() {
        let fx = Fixture::new();
        let err = materializer(&fx).update(&read_object(READ)).await.unwrap_err();
        assert!(matches!(err, FederationError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_person_changes_profile() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let mut person = Person::new(iri("https://example.test/user/alice"));
        person.summary = Some("reads a lot".into());
        m.update(&person.into()).await.unwrap();

        let alice = fx.identities.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.summary, "reads a lot");
        assert_eq!(alice.display_name, "ALICE");
    }

    #[tokio::test]
    async fn update_person_errors() {
        let fx = Fixture::new();
        let m = materializer(&fx);

        let ghost = Person::new(iri("https://example.test/user/ghost"));
        let err = m.update(&ghost.into()).await.unwrap_err();
        assert!(matches!(err, FederationError::UnknownActor(ref u) if u == "ghost"));

        let not_profile = Person::new(iri("https://example.test/user/alice/inbox"));
        let err = m.update(&not_profile.into()).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedResource(_)));

        let mut remote = Person::new(iri("https://remote.test/user/alice"));
        remote.summary = Some("impostor".into());
        let err = m.update(&remote.into()).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedResource(_)));
        let alice = fx.identities.get_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.summary, "");
    }

    #[tokio::test]
    async fn update_rejects_other_kinds() {
        let fx = Fixture::new();
        let collection = Collection::empty(iri("https://example.test/user/alice/followers"));
        let err = materializer(&fx).update(&collection.into()).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedActivityType(_)));
    }

    #[tokio::test]
    async fn delete_read_is_idempotent() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        m.create(&read_object(READ)).await.unwrap();
        m.delete(&iri(READ)).await.unwrap();
        assert!(fx.activities.is_empty());
        m.delete(&iri(READ)).await.unwrap();
    }

    #[tokio::test]
    async fn delete_other_kinds() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let err = m
            .delete(&iri("https://example.test/user/alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedActivityType(_)));
        let err = m.delete(&iri("https://example.test/misc")).await.unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedResource(_)));
    }

    // -----------------------------------------------------------------------
    // Actor collections
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn following_and_liked_are_empty() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let alice = iri("https://example.test/user/alice");
        let following = m.following(&alice).await.unwrap();
        assert_eq!(following.id.as_str(), "https://example.test/user/alice/following");
        assert_eq!(following.total_items, 0);
        let liked = m.liked(&alice).await.unwrap();
        assert_eq!(liked.id.as_str(), "https://example.test/user/alice/liked");
        assert!(liked.items.is_empty());
    }

    #[tokio::test]
    async fn actor_collection_errors() {
        let fx = Fixture::new();
        let m = materializer(&fx);
        let err = m
            .followers(&iri("https://example.test/user/ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, FederationError::UnknownActor(_)));
        let err = m
            .liked(&iri("https://example.test/user/alice/outbox"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FederationError::ResourceNotRecognized { expected: "profile", .. }
        ));
        let err = m
            .followers(&iri("https://remote.test/user/alice"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            FederationError::ResourceNotRecognized { expected: "profile", .. }
        ));
    }
}

use exlibris_types::{validate_username, Iri, TypeError};
use tracing::debug;
use uuid::Uuid;

use crate::config::FederationConfig;
use crate::error::{FederationError, Result};
use crate::resolver::ResourceRef;
use crate::vocab::FederatedObject;

/// The local user on whose behalf a request is made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedActor {
    username: String,
}

impl AuthenticatedActor {
    pub fn new(username: impl Into<String>) -> std::result::Result<Self, TypeError> {
        let username = username.into();
        validate_username(&username)?;
        Ok(Self { username })
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Mints identifiers for objects created by local actors.
///
/// Ids are random (UUID v4), so uniqueness is probabilistic and nothing is
/// checked against storage.
#[derive(Clone, Debug)]
pub struct IdGenerator {
    config: FederationConfig,
}

impl IdGenerator {
    pub fn new(config: FederationConfig) -> Self {
        Self { config }
    }

    /// A fresh IRI for `hint`, owned by `actor`:
    /// `{base}/user/<name>/read/<uuid>`.
    ///
    /// Only reads get ids. The hint is matched on its type alone, so a draft
    /// that has no id yet may be passed as [`FederatedObject::Unknown`].
    pub fn new_id(
        &self,
        actor: Option<&AuthenticatedActor>,
        hint: &FederatedObject,
    ) -> Result<Iri> {
        let actor = actor.ok_or(FederationError::Unauthenticated)?;
        if hint.kind() != "Read" {
            return Err(FederationError::UnsupportedActivityType(
                hint.kind().to_string(),
            ));
        }
        let id = ResourceRef::ReadActivity {
            username: actor.username.clone(),
            activity_id: Uuid::new_v4().to_string(),
        }
        .to_iri(&self.config)?;
        debug!(%id, actor = actor.username(), "minted id");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::resolve;
    use crate::test_support::{config, iri, read_activity};
    use crate::vocab::{Person, Read};
    use std::collections::HashSet;

    fn hint() -> FederatedObject {
        let a = read_activity("https://example.test/user/alice/read/x");
        Read::from_activity(&a, a.actor.clone(), Vec::new()).into()
    }

    #[test]
    fn minted_ids_resolve_to_reads_of_the_actor() {
        let ids = IdGenerator::new(config());
        let alice = AuthenticatedActor::new("alice").unwrap();
        let id = ids.new_id(Some(&alice), &hint()).unwrap();
        assert!(id.as_str().starts_with("https://example.test/user/alice/read/"));
        match resolve(&id) {
            Some(ResourceRef::ReadActivity {
                username,
                activity_id,
            }) => {
                assert_eq!(username, "alice");
                assert_eq!(activity_id.len(), 36);
                assert!(Uuid::parse_str(&activity_id).is_ok());
            }
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn ids_are_distinct() {
        let ids = IdGenerator::new(config());
        let alice = AuthenticatedActor::new("alice").unwrap();
        let minted: HashSet<Iri> = (0..1000)
            .map(|_| ids.new_id(Some(&alice), &hint()).unwrap())
            .collect();
        assert_eq!(minted.len(), 1000);
    }

    #[test]
    fn minted_ids_are_owned_under_default_port() {
        let config = FederationConfig::new("https", "example.test:443").unwrap();
        let alice = AuthenticatedActor::new("alice").unwrap();
        let id = IdGenerator::new(config.clone())
            .new_id(Some(&alice), &hint())
            .unwrap();
        assert!(id.as_str().starts_with("https://example.test/user/alice/read/"));
        assert!(config.owns(&id));
    }

    #[test]
    fn requires_actor() {
        let err = IdGenerator::new(config()).new_id(None, &hint()).unwrap_err();
        assert!(matches!(err, FederationError::Unauthenticated));
    }

    #[test]
    fn only_reads_get_ids() {
        let alice = AuthenticatedActor::new("alice").unwrap();
        let person: FederatedObject = Person::new(iri("https://example.test/user/alice")).into();
        let err = IdGenerator::new(config())
            .new_id(Some(&alice), &person)
            .unwrap_err();
        assert!(matches!(err, FederationError::UnsupportedActivityType(ref k) if k == "Person"));
    }

    #[test]
    fn draft_hint_by_type_name() {
        let alice = AuthenticatedActor::new("alice").unwrap();
        let draft = FederatedObject::Unknown {
            kind: "Read".into(),
            id: None,
        };
        assert!(IdGenerator::new(config()).new_id(Some(&alice), &draft).is_ok());
    }

    #[test]
    fn actor_username_is_validated() {
        assert!(AuthenticatedActor::new("").is_err());
        assert!(AuthenticatedActor::new("a/b").is_err());
        assert_eq!(AuthenticatedActor::new("bob").unwrap().username(), "bob");
    }
}

//! Federation object-store adapter for exlibris.
//!
//! A federation protocol engine handles delivery, signatures and dispatch;
//! this crate is the storage side it calls into. It provides:
//! - Per-IRI locking ([`LockManager`])
//! - IRI classification into typed resource references ([`resolve`])
//! - Idempotent merge of inbox and outbox snapshots
//!   ([`CollectionSynchronizer`])
//! - Rendering and persistence of users and reads ([`ObjectMaterializer`])
//! - Identifier minting ([`IdGenerator`])
//! - The [`FederationDatabase`] contract and its [`FederationStore`]
//!   implementation over any set of repositories

pub mod clock;
pub mod collection;
pub mod config;
pub mod error;
pub mod id;
pub mod lock;
pub mod materializer;
pub mod resolver;
pub mod store;
pub mod traits;
pub mod vocab;

#[cfg(test)]
mod test_support;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::CollectionSynchronizer;
pub use config::{ConfigError, FederationConfig};
pub use error::{FederationError, Result};
pub use id::{AuthenticatedActor, IdGenerator};
pub use lock::LockManager;
pub use materializer::ObjectMaterializer;
pub use resolver::{
    collection_owner, following_iri, liked_iri, profile_iri, resolve, ResourceRef,
};
pub use store::{FederationStore, Repositories};
pub use traits::FederationDatabase;
pub use vocab::{
    Attribution, Collection, Document, FederatedObject, OrderedCollectionPage, Person, Read,
    ACTIVITY_STREAMS_CONTEXT, PUBLIC_COLLECTION,
};

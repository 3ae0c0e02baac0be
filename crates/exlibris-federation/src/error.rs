use exlibris_store::StoreError;
use exlibris_types::{Iri, TypeError};
use thiserror::Error;

/// Errors returned by the federation adapter.
///
/// The adapter's only externally visible behavior is these typed results;
/// mapping them to transport status codes belongs to the caller.
#[derive(Debug, Error)]
pub enum FederationError {
    /// The addressed resource does not exist.
    #[error("not found: {0}")]
    NotFound(Iri),

    /// The IRI addressing scheme is not one this deployment serves.
    #[error("unsupported resource: {0}")]
    UnsupportedResource(Iri),

    /// The payload kind is not one this deployment handles.
    #[error("unsupported activity type: {0}")]
    UnsupportedActivityType(String),

    /// The IRI does not resolve to the kind of resource the operation needs.
    #[error("resource not recognized as {expected}: {iri}")]
    ResourceNotRecognized { iri: Iri, expected: &'static str },

    /// The owning actor of a collection or profile does not exist.
    #[error("unknown actor: {0}")]
    UnknownActor(String),

    /// An identifier was requested without an authenticated actor.
    #[error("no authenticated actor")]
    Unauthenticated,

    /// Unlock was called for an IRI that is not locked.
    #[error("lock does not exist for {0}")]
    NotLocked(Iri),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StoreError),

    #[error(transparent)]
    InvalidIri(#[from] TypeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used throughout the federation crate.
pub type Result<T> = std::result::Result<T, FederationError>;

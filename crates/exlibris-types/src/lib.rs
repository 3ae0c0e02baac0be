//! Foundation types for exlibris.
//!
//! This crate provides the identity, activity, and collection types shared
//! by the storage backends and the federation adapter. Every other exlibris
//! crate depends on `exlibris-types`.
//!
//! # Key Types
//!
//! - [`Iri`]: Parsed absolute resource identifier
//! - [`Actor`]: Registered account addressable as a federated actor
//! - [`ReadActivity`]: Persisted "read" event for a [`Book`]
//! - [`MembershipRecord`]: Fact that an item belongs to an inbox or outbox
//! - [`CollectionKind`]: Inbox or outbox

pub mod activity;
pub mod actor;
pub mod error;
pub mod iri;
pub mod membership;

pub use activity::{Author, Book, ReadActivity};
pub use actor::{validate_username, Actor, ProfileUpdate};
pub use error::TypeError;
pub use iri::Iri;
pub use membership::{CollectionKind, MembershipRecord, RecordId};

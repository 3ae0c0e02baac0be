//! Storage interfaces for exlibris.
//!
//! The federation adapter is storage-engine agnostic: it talks to accounts,
//! collection membership, and read activities only through the traits in
//! this crate.
//!
//! # Repositories
//!
//! - [`IdentityStore`] -- accounts by username, optionally with followers
//! - [`MembershipRepository`] -- append-only inbox/outbox membership records
//! - [`ActivityRepository`] -- read activities keyed by IRI
//!
//! # Storage Backends
//!
//! - [`InMemoryIdentityStore`], [`InMemoryMembershipRepository`],
//!   [`InMemoryActivityRepository`] -- `HashMap`-based, for tests and embedding
//!
//! # Design Rules
//!
//! 1. Membership records are never updated or deleted.
//! 2. At most one membership record exists per `(collection, item)` pair.
//! 3. Lookups of absent rows return `Ok(None)`, not an error.
//! 4. All backend errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryActivityRepository, InMemoryIdentityStore, InMemoryMembershipRepository};
pub use traits::{ActivityRepository, IdentityStore, MembershipRepository};

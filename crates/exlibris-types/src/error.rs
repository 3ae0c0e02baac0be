use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid IRI {input:?}: {reason}")]
    InvalidIri { input: String, reason: String },

    #[error("invalid username {0:?}")]
    InvalidUsername(String),
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::iri::Iri;

/// A registered account, addressable as a federated actor.
///
/// `followers` is only populated by lookups that explicitly preload it;
/// plain lookups leave it empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Iri,
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub summary: String,
    /// Hosted on this deployment.
    pub local: bool,
    #[serde(default)]
    pub followers: Vec<Iri>,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    /// A local actor with no summary and no followers.
    pub fn new(
        id: Iri,
        username: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, TypeError> {
        let username = username.into();
        validate_username(&username)?;
        Ok(Self {
            id,
            username,
            display_name: display_name.into(),
            summary: String::new(),
            local: true,
            followers: Vec::new(),
            created_at: Utc::now(),
        })
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Apply a federated profile update. Absent fields are left unchanged.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(name) = &update.display_name {
            self.display_name = name.clone();
        }
        if let Some(summary) = &update.summary {
            self.summary = summary.clone();
        }
    }
}

/// The mutable subset of a profile that federation may change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub summary: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none() && self.summary.is_none()
    }
}

/// Validate a username for use as an IRI path segment.
///
/// Usernames are non-empty ASCII made of letters, digits, `_`, `-` and `.`,
/// and may not be `.` or `..`. These never need percent-encoding, so an IRI
/// built from a valid username resolves back to the same username.
///
/// ```
/// use exlibris_types::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("alice/outbox").is_err());
/// ```
pub fn validate_username(name: &str) -> Result<(), TypeError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(TypeError::InvalidUsername(name.to_string()))
    }
}

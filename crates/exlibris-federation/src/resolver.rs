//! IRI classification.
//!
//! Every resource this deployment serves lives under `/user/<name>`. An IRI
//! is classified by the tail of its path against an ordered list of
//! matchers, most specific first; the first match wins. Scheme, host, query
//! and fragment do not participate, so classification says nothing about
//! ownership (see [`ObjectMaterializer::owns`](crate::ObjectMaterializer::owns)).

use std::fmt;

use exlibris_types::{CollectionKind, Iri, TypeError};

use crate::config::FederationConfig;
use crate::error::FederationError;

/// A resolved reference to a resource this deployment knows how to serve.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Profile { username: String },
    Followers { username: String },
    InboxPage { username: String },
    OutboxPage { username: String },
    ReadActivity { username: String, activity_id: String },
}

impl ResourceRef {
    /// The actor that owns the resource.
    pub fn username(&self) -> &str {
        match self {
            Self::Profile { username }
            | Self::Followers { username }
            | Self::InboxPage { username }
            | Self::OutboxPage { username }
            | Self::ReadActivity { username, .. } => username,
        }
    }

    /// Short name of the kind, used in errors and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Profile { .. } => "profile",
            Self::Followers { .. } => "followers",
            Self::InboxPage { .. } => "inbox",
            Self::OutboxPage { .. } => "outbox",
            Self::ReadActivity { .. } => "read activity",
        }
    }

    /// The collection kind, for inbox and outbox pages.
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        match self {
            Self::InboxPage { .. } => Some(CollectionKind::Inbox),
            Self::OutboxPage { .. } => Some(CollectionKind::Outbox),
            _ => None,
        }
    }

    /// The reference to the same actor's collection of `kind`.
    pub fn collection(username: impl Into<String>, kind: CollectionKind) -> Self {
        let username = username.into();
        match kind {
            CollectionKind::Inbox => Self::InboxPage { username },
            CollectionKind::Outbox => Self::OutboxPage { username },
        }
    }

    /// Build the canonical IRI on this deployment. Resolving the result
    /// yields `self` again.
    pub fn to_iri(&self, config: &FederationConfig) -> Result<Iri, TypeError> {
        let profile = profile_path(config, self.username());
        let full = match self {
            Self::Profile { .. } => profile,
            Self::Followers { .. } => format!("{profile}/followers"),
            Self::InboxPage { .. } => format!("{profile}/inbox"),
            Self::OutboxPage { .. } => format!("{profile}/outbox"),
            Self::ReadActivity { activity_id, .. } => format!("{profile}/read/{activity_id}"),
        };
        Iri::parse(&full)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadActivity {
                username,
                activity_id,
            } => write!(f, "read {activity_id} of {username}"),
            other => write!(f, "{} of {}", other.kind_name(), other.username()),
        }
    }
}

fn profile_path(config: &FederationConfig, username: &str) -> String {
    format!("{}/user/{username}", config.base_url())
}

/// Canonical profile IRI for `username`.
pub fn profile_iri(config: &FederationConfig, username: &str) -> Result<Iri, TypeError> {
    Iri::parse(&profile_path(config, username))
}

/// IRI of the collection of actors `username` follows. Not a resolvable
/// kind.
pub fn following_iri(config: &FederationConfig, username: &str) -> Result<Iri, TypeError> {
    Iri::parse(&format!("{}/following", profile_path(config, username)))
}

/// IRI of the collection of objects `username` liked. Not a resolvable kind.
pub fn liked_iri(config: &FederationConfig, username: &str) -> Result<Iri, TypeError> {
    Iri::parse(&format!("{}/liked", profile_path(config, username)))
}

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

/// What follows `/user/<name>` at the end of the path.
#[derive(Clone, Copy)]
enum Tail {
    /// `/read/<activity-id>`
    ActivityId,
    /// A single literal segment.
    Literal(&'static str),
    /// Nothing.
    End,
}

struct Matcher {
    tail: Tail,
    build: fn(String, String) -> ResourceRef,
}

const MATCHERS: [Matcher; 5] = [
    Matcher {
        tail: Tail::ActivityId,
        build: |username, activity_id| ResourceRef::ReadActivity {
            username,
            activity_id,
        },
    },
    Matcher {
        tail: Tail::Literal("followers"),
        build: |username, _| ResourceRef::Followers { username },
    },
    Matcher {
        tail: Tail::Literal("outbox"),
        build: |username, _| ResourceRef::OutboxPage { username },
    },
    Matcher {
        tail: Tail::Literal("inbox"),
        build: |username, _| ResourceRef::InboxPage { username },
    },
    Matcher {
        tail: Tail::End,
        build: |username, _| ResourceRef::Profile { username },
    },
];

fn is_activity_id(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

impl Matcher {
    /// Returns `(username, activity_id)` on a match; the id is empty for
    /// kinds that carry none.
    fn capture<'a>(&self, segments: &[&'a str]) -> Option<(&'a str, &'a str)> {
        let (username, id) = match self.tail {
            Tail::ActivityId => match segments {
                [.., "user", name, "read", id] if is_activity_id(id) => (*name, *id),
                _ => return None,
            },
            Tail::Literal(literal) => match segments {
                [.., "user", name, last] if *last == literal => (*name, ""),
                _ => return None,
            },
            Tail::End => match segments {
                [.., "user", name] => (*name, ""),
                _ => return None,
            },
        };
        (!username.is_empty()).then_some((username, id))
    }
}

/// Classify `iri`. Returns `None` for anything that is not one of the
/// known resource shapes; never fails.
pub fn resolve(iri: &Iri) -> Option<ResourceRef> {
    let path = iri.path();
    let segments: Vec<&str> = path.strip_prefix('/').unwrap_or(path).split('/').collect();
    MATCHERS.iter().find_map(|m| {
        m.capture(&segments)
            .map(|(username, id)| (m.build)(username.to_string(), id.to_string()))
    })
}

/// The owning username of the `kind` collection at `iri`.
pub fn collection_owner(iri: &Iri, kind: CollectionKind) -> Result<String, FederationError> {
    match resolve(iri) {
        Some(r) if r.collection_kind() == Some(kind) => Ok(r.username().to_string()),
        _ => Err(FederationError::ResourceNotRecognized {
            iri: iri.clone(),
            expected: kind.segment(),
        }),
    }
}

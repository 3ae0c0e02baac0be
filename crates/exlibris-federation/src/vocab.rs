//! The slice of the ActivityStreams vocabulary exchanged with the protocol
//! engine.
//!
//! Each object type serializes with its `type` tag. [`FederatedObject`] is
//! the union the store accepts and returns; payloads of any other type are
//! kept as [`FederatedObject::Unknown`] so they can be rejected with a
//! typed error instead of failing to parse.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use exlibris_types::{Author, Book, Iri, ProfileUpdate, ReadActivity};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

pub const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// Addressing a read here makes it visible to everyone.
pub const PUBLIC_COLLECTION: &str = "https://www.w3.org/ns/activitystreams#Public";

// ---------------------------------------------------------------------------
// Object types
// ---------------------------------------------------------------------------

/// A federated actor profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Person {
    pub id: Iri,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outbox: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub following: Option<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<Iri>,
}

impl Person {
    /// A bare profile carrying only its id.
    pub fn new(id: Iri) -> Self {
        Self {
            id,
            name: None,
            preferred_username: None,
            summary: None,
            url: None,
            inbox: None,
            outbox: None,
            followers: None,
            following: None,
            liked: None,
        }
    }

    /// The fields a federated update may change.
    pub fn profile_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            display_name: self.name.clone(),
            summary: self.summary.clone(),
        }
    }
}

/// An author reference inside a [`Document`]: a `Person` with an optional
/// id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Person")]
pub struct Attribution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Iri>,
    pub name: String,
}

/// A book.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Document {
    pub id: Iri,
    pub name: String,
    /// January 1st of the publication year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributed_to: Vec<Attribution>,
}

impl From<&Book> for Document {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.clone(),
            name: book.title.clone(),
            published: book
                .published_year
                .and_then(|y| NaiveDate::from_ymd_opt(y, 1, 1))
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            attributed_to: book
                .authors
                .iter()
                .map(|a| Attribution {
                    id: a.id.clone(),
                    name: a.name.clone(),
                })
                .collect(),
        }
    }
}

impl From<Document> for Book {
    fn from(doc: Document) -> Self {
        Self {
            id: doc.id,
            title: doc.name,
            published_year: doc.published.map(|p| p.year()),
            authors: doc
                .attributed_to
                .into_iter()
                .map(|a| Author {
                    id: a.id,
                    name: a.name,
                })
                .collect(),
        }
    }
}

/// "`actor` read `object`".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Read {
    pub id: Iri,
    pub actor: Iri,
    pub object: Document,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Iri>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl Read {
    /// Render a stored read. `actor` and `to` are supplied by the caller so
    /// that rendering reflects the current deployment rather than whatever
    /// was stored.
    pub fn from_activity(activity: &ReadActivity, actor: Iri, to: Vec<Iri>) -> Self {
        Self {
            id: activity.id.clone(),
            actor,
            object: Document::from(&activity.book),
            to,
            published: Some(activity.published),
        }
    }

    /// Convert to the stored form, stamping `fallback` when the payload
    /// carries no publication time.
    pub fn into_activity(self, fallback: DateTime<Utc>) -> ReadActivity {
        ReadActivity {
            id: self.id,
            actor: self.actor,
            book: self.object.into(),
            to: self.to,
            published: self.published.unwrap_or(fallback),
        }
    }
}

/// An unordered collection, e.g. an actor's followers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct Collection {
    pub id: Iri,
    pub total_items: usize,
    #[serde(default)]
    pub items: Vec<Iri>,
}

impl Collection {
    pub fn new(id: Iri, items: Vec<Iri>) -> Self {
        Self {
            id,
            total_items: items.len(),
            items,
        }
    }

    pub fn empty(id: Iri) -> Self {
        Self::new(id, Vec::new())
    }
}

/// A snapshot of an inbox or outbox, most recent item first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub struct OrderedCollectionPage {
    pub id: Iri,
    #[serde(default)]
    pub ordered_items: Vec<Iri>,
}

impl OrderedCollectionPage {
    pub fn new(id: Iri, ordered_items: Vec<Iri>) -> Self {
        Self { id, ordered_items }
    }

    pub fn len(&self) -> usize {
        self.ordered_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FederatedObject
// ---------------------------------------------------------------------------

/// Any object passed through the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FederatedObject {
    Read(Read),
    Person(Person),
    Collection(Collection),
    /// A payload of a type this deployment does not handle.
    Unknown { kind: String, id: Option<Iri> },
}

impl FederatedObject {
    /// The `type` tag.
    pub fn kind(&self) -> &str {
        match self {
            Self::Read(_) => "Read",
            Self::Person(_) => "Person",
            Self::Collection(_) => "Collection",
            Self::Unknown { kind, .. } => kind,
        }
    }

    pub fn id(&self) -> Option<&Iri> {
        match self {
            Self::Read(r) => Some(&r.id),
            Self::Person(p) => Some(&p.id),
            Self::Collection(c) => Some(&c.id),
            Self::Unknown { id, .. } => id.as_ref(),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde_json::Error::custom("object has no \"type\""))?
            .to_string();
        Ok(match kind.as_str() {
            "Read" => Self::Read(serde_json::from_value(value)?),
            "Person" => Self::Person(serde_json::from_value(value)?),
            "Collection" => Self::Collection(serde_json::from_value(value)?),
            _ => {
                let id = value
                    .get("id")
                    .and_then(Value::as_str)
                    .and_then(|s| Iri::parse(s).ok());
                Self::Unknown { kind, id }
            }
        })
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        Self::from_value(serde_json::from_str(s)?)
    }

    /// Serialize as a top-level document, with `@context`.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Value::Object(map) = &mut value {
            map.insert(
                "@context".into(),
                Value::String(ACTIVITY_STREAMS_CONTEXT.into()),
            );
        }
        Ok(value)
    }
}

impl Serialize for FederatedObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Read(r) => r.serialize(serializer),
            Self::Person(p) => p.serialize(serializer),
            Self::Collection(c) => c.serialize(serializer),
            Self::Unknown { kind, id } => {
                #[derive(Serialize)]
                struct Raw<'a> {
                    #[serde(rename = "type")]
                    kind: &'a str,
                    #[serde(skip_serializing_if = "Option::is_none")]
                    id: Option<&'a Iri>,
                }
                Raw {
                    kind,
                    id: id.as_ref(),
                }
                .serialize(serializer)
            }
        }
    }
}

impl<'de> Deserialize<'de> for FederatedObject {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(D::Error::custom)
    }
}

impl From<Read> for FederatedObject {
    fn from(r: Read) -> Self {
        Self::Read(r)
    }
}

impl From<Person> for FederatedObject {
    fn from(p: Person) -> Self {
        Self::Person(p)
    }
}

impl From<Collection> for FederatedObject {
    fn from(c: Collection) -> Self {
        Self::Collection(c)
    }
}

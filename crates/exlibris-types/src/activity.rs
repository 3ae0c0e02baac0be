use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::iri::Iri;

const OPEN_LIBRARY_WORKS: &str = "https://openlibrary.org/works";
const OPEN_LIBRARY_AUTHORS: &str = "https://openlibrary.org/authors";

/// A person who wrote a [`Book`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Option<Iri>,
    pub name: String,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// An author keyed by an Open Library author id (e.g. `OL19430A`).
    pub fn open_library(author_id: &str, name: impl Into<String>) -> Result<Self, TypeError> {
        Ok(Self {
            id: Some(Iri::parse(&format!("{OPEN_LIBRARY_AUTHORS}/{author_id}/"))?),
            name: name.into(),
        })
    }
}

/// A catalog work referenced by a read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Iri,
    pub title: String,
    pub published_year: Option<i32>,
    #[serde(default)]
    pub authors: Vec<Author>,
}

impl Book {
    pub fn new(id: Iri, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            published_year: None,
            authors: Vec::new(),
        }
    }

    /// A book keyed by an Open Library work id (e.g. `OL14911626W`).
    pub fn open_library(work_id: &str, title: impl Into<String>) -> Result<Self, TypeError> {
        let id = Iri::parse(&format!("{OPEN_LIBRARY_WORKS}/{work_id}/"))?;
        Ok(Self::new(id, title))
    }

    pub fn published(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    pub fn by(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }
}

/// A persisted "read" event: `actor` finished reading `book`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadActivity {
    pub id: Iri,
    pub actor: Iri,
    pub book: Book,
    /// Audience the activity was addressed to.
    #[serde(default)]
    pub to: Vec<Iri>,
    pub published: DateTime<Utc>,
}

impl ReadActivity {
    pub fn new(id: Iri, actor: Iri, book: Book, published: DateTime<Utc>) -> Self {
        Self {
            id,
            actor,
            book,
            to: Vec::new(),
            published,
        }
    }

    pub fn addressed_to(mut self, audience: impl IntoIterator<Item = Iri>) -> Self {
        self.to.extend(audience);
        self
    }
}

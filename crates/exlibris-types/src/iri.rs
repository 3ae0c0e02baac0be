use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TypeError;

/// An absolute resource identifier (profile, collection, activity).
///
/// Cheaply clonable: the parsed [`Url`] is shared behind an `Arc`. Two
/// `Iri`s compare equal when their normalized textual forms are equal, so an
/// `Iri` is usable directly as a map key.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri(Arc<Url>);

impl Iri {
    /// Parse an absolute IRI. The IRI must carry a host.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let url = Url::parse(input).map_err(|e| TypeError::InvalidIri {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::try_from(url)
    }

    /// The normalized textual form.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Host plus explicit port, e.g. `example.test` or `localhost:8080`.
    ///
    /// Default ports are elided by the parser, so `https://a.test:443/` and
    /// `https://a.test/` share an authority.
    pub fn authority(&self) -> String {
        let host = self.0.host_str().unwrap_or_default();
        match self.0.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// The path component, always starting with `/`.
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Access the underlying parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl TryFrom<Url> for Iri {
    type Error = TypeError;

    fn try_from(url: Url) -> Result<Self, Self::Error> {
        if !url.has_host() {
            return Err(TypeError::InvalidIri {
                input: url.to_string(),
                reason: "missing host".into(),
            });
        }
        Ok(Self(Arc::new(url)))
    }
}

impl TryFrom<String> for Iri {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Iri> for String {
    fn from(value: Iri) -> Self {
        value.as_str().to_string()
    }
}

impl FromStr for Iri {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Iri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Iri({:?})", self.as_str())
    }
}

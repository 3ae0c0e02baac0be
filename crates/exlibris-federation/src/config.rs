use std::path::Path;

use exlibris_types::Iri;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a [`FederationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} not provided")]
    Missing(&'static str),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where this deployment is hosted.
///
/// Every locally minted IRI starts with `{scheme}://{domain}`, and an IRI is
/// owned by this deployment exactly when its scheme and authority match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederationConfig {
    pub scheme: String,
    /// Host with an optional port, e.g. `example.test` or `localhost:8080`.
    pub domain: String,
}

impl Default for FederationConfig {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            domain: "localhost".into(),
        }
    }
}

impl FederationConfig {
    pub fn new(scheme: impl Into<String>, domain: impl Into<String>) -> Result<Self, ConfigError> {
        Self {
            scheme: scheme.into(),
            domain: domain.into(),
        }
        .normalized()
    }

    /// Parse from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.normalized()
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Build from `SCHEME` (default `https`) and `DOMAIN` (required).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup, with the same rules as
    /// [`from_env`](Self::from_env).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let scheme = match lookup("SCHEME").filter(|s| !s.is_empty()) {
            Some(scheme) => scheme,
            None => {
                tracing::info!("SCHEME not provided, defaulting to https");
                "https".into()
            }
        };
        let domain = lookup("DOMAIN")
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::Missing("DOMAIN"))?;
        Self::new(scheme, domain)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheme_ok = !self.scheme.is_empty()
            && self
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        if !scheme_ok {
            return Err(ConfigError::Invalid {
                field: "scheme",
                reason: format!("{:?} is not a URI scheme", self.scheme),
            });
        }
        if self.domain.is_empty() || self.domain.contains(['/', '?', '#', ' ']) {
            return Err(ConfigError::Invalid {
                field: "domain",
                reason: format!("{:?} is not a host", self.domain),
            });
        }
        Ok(())
    }

    /// Validate, then rewrite `domain` to the authority the IRI parser
    /// produces for the base, so default ports and host case agree with
    /// every IRI minted under it.
    fn normalized(mut self) -> Result<Self, ConfigError> {
        self.validate()?;
        let base = Iri::parse(&self.base_url()).map_err(|e| ConfigError::Invalid {
            field: "domain",
            reason: e.to_string(),
        })?;
        self.scheme = base.scheme().to_string();
        self.domain = base.authority();
        Ok(self)
    }

    /// Whether `iri` is hosted here: same scheme and authority. Hosts
    /// compare case-insensitively.
    pub fn owns(&self, iri: &Iri) -> bool {
        iri.scheme() == self.scheme && iri.authority().eq_ignore_ascii_case(&self.domain)
    }

    /// `{scheme}://{domain}` with no trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.domain)
    }
}

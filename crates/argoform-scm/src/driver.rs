//! Provider identification from repository hosts
//!
//! Well-known hosts map to their provider out of the box. Self-hosted
//! instances need an explicit mapping, built from configuration and passed to
//! [`crate::Repository::new`] rather than stored globally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ScmError};
use crate::github::GitHub;
use crate::gitlab::GitLab;
use crate::provider::GitProvider;

/// Supported git hosting providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    GitHub,
    GitLab,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::GitHub, Provider::GitLab];

    /// Driver name as used in configuration
    pub fn as_str(&self) -> &'static str {
        self.driver().name()
    }

    /// Provider-specific behaviour
    pub fn driver(&self) -> &'static dyn GitProvider {
        match self {
            Provider::GitHub => &GitHub,
            Provider::GitLab => &GitLab,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ScmError;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ScmError::UnknownDriver {
                driver: s.to_string(),
            })
    }
}

/// Host to provider mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverIdentifier {
    mappings: BTreeMap<String, Provider>,
}

impl Default for DriverIdentifier {
    fn default() -> Self {
        let mut mappings = BTreeMap::new();
        mappings.insert("github.com".to_string(), Provider::GitHub);
        mappings.insert("gitlab.com".to_string(), Provider::GitLab);
        Self { mappings }
    }
}

impl DriverIdentifier {
    /// Identifier knowing only the public hosts
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the provider for a host
    pub fn with_mapping(mut self, host: impl AsRef<str>, provider: Provider) -> Self {
        self.mappings
            .insert(host.as_ref().to_ascii_lowercase(), provider);
        self
    }

    /// Identifier mapping the host of `url` to a named driver
    pub fn for_private_repo(url: &str, driver: &str) -> Result<Self> {
        let provider = driver.parse::<Provider>()?;
        let host = host_from_url(url)?;
        Ok(Self::default().with_mapping(host, provider))
    }

    /// Provider for a host
    pub fn identify(&self, host: &str) -> Result<Provider> {
        self.mappings
            .get(&host.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| ScmError::UnsupportedProvider {
                host: host.to_string(),
            })
    }
}

/// Lowercased host of a repository URL
pub fn host_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| ScmError::InvalidRepositoryUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    parsed
        .host_str()
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| ScmError::InvalidRepositoryUrl {
            url: url.to_string(),
            reason: "host is empty".to_string(),
        })
}

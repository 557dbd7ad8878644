//! Parsed git repositories
//!
//! A [`Repository`] is parsed once from a URL and is read-only afterwards.
//! It produces the push TriggerBinding and the EventListener trigger for
//! its provider.

use argoform_core::meta;
use argoform_core::resources::{
    EventListenerBinding, EventListenerTemplate, EventListenerTrigger, TriggerBinding,
    TriggerBindingSpec,
};

use crate::driver::{DriverIdentifier, Provider};
use crate::error::{Result, ScmError};
use crate::provider::{GitProvider, cel_interceptor};

/// A repository on a known git host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    url: String,
    host: String,
    path: String,
    provider: Provider,
}

impl Repository {
    /// Parse a repository URL, identifying the provider from its host
    pub fn new(url: &str, identifier: &DriverIdentifier) -> Result<Self> {
        let parsed = parse_url(url)?;
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        let provider = identifier.identify(&host)?;
        Self::from_parsed(url, &parsed, host, provider)
    }

    /// Parse a repository URL for an explicitly chosen provider
    pub fn with_provider(url: &str, provider: Provider) -> Result<Self> {
        let parsed = parse_url(url)?;
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        Self::from_parsed(url, &parsed, host, provider)
    }

    fn from_parsed(url: &str, parsed: &url::Url, host: String, provider: Provider) -> Result<Self> {
        let raw_path = parsed.path();
        let trimmed = raw_path.trim_matches('/');
        let path = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        if path.is_empty() {
            return Err(ScmError::InvalidRepositoryUrl {
                url: url.to_string(),
                reason: "path is empty".to_string(),
            });
        }
        if !provider.driver().is_valid_path(path) {
            return Err(ScmError::InvalidRepositoryPath {
                provider: provider.to_string(),
                path: raw_path.to_string(),
            });
        }

        Ok(Self {
            url: url.to_string(),
            host,
            path: path.to_string(),
            provider,
        })
    }

    /// URL the repository was parsed from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `owner/repo` or `group/.../repo`
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    fn driver(&self) -> &'static dyn GitProvider {
        self.provider.driver()
    }

    /// Name of this provider's push TriggerBinding
    pub fn push_binding_name(&self) -> String {
        self.driver().push_binding_name()
    }

    /// TriggerBinding normalizing this provider's push payload, with its name
    pub fn create_push_binding(&self, namespace: &str) -> (TriggerBinding, String) {
        let name = self.push_binding_name();
        let mut binding = TriggerBinding::new(
            &name,
            TriggerBindingSpec {
                params: self.driver().push_binding_params(),
            },
        );
        binding.metadata = meta::namespaced(namespace, name.as_str());
        (binding, name)
    }

    /// Trigger firing `template` on branch pushes to this repository
    ///
    /// Interceptors run in order: the provider's secret check, then the CEL
    /// filter and overlays.
    pub fn create_push_trigger(
        &self,
        name: &str,
        secret_name: &str,
        namespace: &str,
        template: &str,
        bindings: &[String],
    ) -> Result<EventListenerTrigger> {
        tracing::debug!(
            trigger = name,
            namespace,
            repository = %self.path,
            provider = %self.provider,
            "creating push trigger"
        );
        let driver = self.driver();
        let cel = cel_interceptor(
            driver.push_event_filter(&self.path),
            &driver.push_overlays(),
        )?;

        Ok(EventListenerTrigger {
            name: name.to_string(),
            interceptors: vec![driver.secret_interceptor(secret_name), cel],
            bindings: bindings
                .iter()
                .map(|b| EventListenerBinding {
                    reference: b.clone(),
                })
                .collect(),
            template: Some(EventListenerTemplate {
                reference: template.to_string(),
            }),
        })
    }
}

fn parse_url(url: &str) -> Result<url::Url> {
    url::Url::parse(url).map_err(|e| ScmError::InvalidRepositoryUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

//! Generated manifests and the path-keyed set that collects them
//!
//! A [`ResourceSet`] maps a canonical relative file path to a typed
//! [`Resource`]. Keys are kept in a `BTreeMap`, so iteration and therefore
//! serialized output are deterministic. Inserting or merging a path that is
//! already present is a [`CoreError::ResourceKeyCollision`]: two builders
//! producing the same file is a path-convention bug, never something to
//! resolve silently.

pub mod argocd;
pub mod triggers;

pub use argocd::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSpec,
    ResourceIgnoreDifferences, SyncPolicy, SyncPolicyAutomated,
};
pub use triggers::{
    EventListener, EventListenerBinding, EventListenerSpec, EventListenerTemplate,
    EventListenerTrigger, InterceptorParam, InterceptorRef, Param, TriggerBinding,
    TriggerBindingSpec, TriggerInterceptor,
};

use k8s_openapi::api::core::v1::Namespace;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoreError, Result};
use crate::paths::{self, KUSTOMIZATION};

const KUSTOMIZE_API_VERSION: &str = "kustomize.config.k8s.io/v1beta1";

/// Kustomize aggregator listing the resources of a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(default = "default_kustomize_api_version")]
    pub api_version: String,
    #[serde(default = "default_kustomize_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
}

fn default_kustomize_api_version() -> String {
    KUSTOMIZE_API_VERSION.to_string()
}

fn default_kustomize_kind() -> String {
    "Kustomization".to_string()
}

impl Default for Kustomization {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Kustomization {
    pub fn new(resources: Vec<String>) -> Self {
        Self {
            api_version: default_kustomize_api_version(),
            kind: default_kustomize_kind(),
            resources,
        }
    }
}

/// A generated manifest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Namespace(Namespace),
    Application(Application),
    EventListener(EventListener),
    TriggerBinding(TriggerBinding),
    Kustomization(Kustomization),
}

impl Resource {
    /// Kubernetes kind of the manifest
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Namespace(_) => "Namespace",
            Self::Application(_) => "Application",
            Self::EventListener(_) => "EventListener",
            Self::TriggerBinding(_) => "TriggerBinding",
            Self::Kustomization(_) => "Kustomization",
        }
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> std::result::Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn as_namespace(&self) -> Option<&Namespace> {
        match self {
            Self::Namespace(ns) => Some(ns),
            _ => None,
        }
    }

    pub fn as_application(&self) -> Option<&Application> {
        match self {
            Self::Application(app) => Some(app),
            _ => None,
        }
    }

    pub fn as_event_listener(&self) -> Option<&EventListener> {
        match self {
            Self::EventListener(el) => Some(el),
            _ => None,
        }
    }

    pub fn as_trigger_binding(&self) -> Option<&TriggerBinding> {
        match self {
            Self::TriggerBinding(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn as_kustomization(&self) -> Option<&Kustomization> {
        match self {
            Self::Kustomization(k) => Some(k),
            _ => None,
        }
    }
}

impl From<Namespace> for Resource {
    fn from(ns: Namespace) -> Self {
        Self::Namespace(ns)
    }
}

impl From<Application> for Resource {
    fn from(app: Application) -> Self {
        Self::Application(app)
    }
}

impl From<EventListener> for Resource {
    fn from(el: EventListener) -> Self {
        Self::EventListener(el)
    }
}

impl From<TriggerBinding> for Resource {
    fn from(tb: TriggerBinding) -> Self {
        Self::TriggerBinding(tb)
    }
}

impl From<Kustomization> for Resource {
    fn from(k: Kustomization) -> Self {
        Self::Kustomization(k)
    }
}

/// Path-keyed collection of generated manifests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResourceSet {
    resources: BTreeMap<String, Resource>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, failing if the path is already taken
    pub fn insert(&mut self, path: impl AsRef<str>, resource: impl Into<Resource>) -> Result<()> {
        let path = paths::to_slash(path.as_ref());
        if self.resources.contains_key(&path) {
            return Err(CoreError::ResourceKeyCollision { path });
        }
        tracing::debug!(path = %path, "generated resource");
        self.resources.insert(path, resource.into());
        Ok(())
    }

    /// Combine two sets, failing on the first shared path
    pub fn merge(mut self, other: ResourceSet) -> Result<ResourceSet> {
        if let Some(path) = other
            .resources
            .keys()
            .find(|path| self.resources.contains_key(*path))
        {
            return Err(CoreError::ResourceKeyCollision { path: path.clone() });
        }
        self.resources.extend(other.resources);
        Ok(self)
    }

    pub fn get(&self, path: &str) -> Option<&Resource> {
        self.resources.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.resources.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Base names of the files directly inside `dir`, sorted
    pub fn file_names_in(&self, dir: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .resources
            .keys()
            .filter(|path| paths::parent(path) == dir)
            .map(|path| paths::base_name(path).to_string())
            .filter(|name| name != KUSTOMIZATION)
            .collect();
        names.sort();
        names
    }

    /// Add a `kustomization.yaml` to `dir` listing its current files
    pub fn add_kustomization(&mut self, dir: &str) -> Result<()> {
        let resources = self.file_names_in(dir);
        self.insert(paths::join([dir, KUSTOMIZATION]), Kustomization::new(resources))
    }

    /// Add a `kustomization.yaml` to every directory that lacks one
    pub fn with_kustomizations(mut self) -> Result<Self> {
        let dirs: BTreeSet<String> = self
            .resources
            .keys()
            .map(|path| paths::parent(path).to_string())
            .collect();

        for dir in dirs {
            if !self.contains(&paths::join([dir.as_str(), KUSTOMIZATION])) {
                self.add_kustomization(&dir)?;
            }
        }
        Ok(self)
    }
}

impl IntoIterator for ResourceSet {
    type Item = (String, Resource);
    type IntoIter = std::collections::btree_map::IntoIter<String, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

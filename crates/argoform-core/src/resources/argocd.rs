//! ArgoCD `Application` custom resource

use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Desired state of an ArgoCD Application
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[kube(
    group = "argoproj.io",
    version = "v1alpha1",
    kind = "Application",
    namespaced,
    schema = "disabled",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    pub project: String,
    pub source: ApplicationSource,
    pub destination: ApplicationDestination,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_policy: Option<SyncPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_differences: Vec<ResourceIgnoreDifferences>,
}

/// Repository location of an Application's manifests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSource {
    #[serde(rename = "repoURL")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_revision: String,
}

/// Cluster and namespace an Application is synced into
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDestination {
    pub namespace: String,
    pub server: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automated: Option<SyncPolicyAutomated>,
}

impl SyncPolicy {
    /// Automated sync with pruning and self-healing
    pub fn automated() -> Self {
        Self {
            automated: Some(SyncPolicyAutomated {
                prune: true,
                self_heal: true,
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicyAutomated {
    pub prune: bool,
    pub self_heal: bool,
}

/// Fields ArgoCD ignores when comparing live and desired state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIgnoreDifferences {
    pub group: String,
    pub kind: String,
    pub json_pointers: Vec<String>,
}

impl ResourceIgnoreDifferences {
    pub fn new(group: &str, kind: &str, pointers: &[&str]) -> Self {
        Self {
            group: group.to_string(),
            kind: kind.to_string(),
            json_pointers: pointers.iter().map(|p| p.to_string()).collect(),
        }
    }
}

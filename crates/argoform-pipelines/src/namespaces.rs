//! Namespace resources
//!
//! Each environment and the CI/CD pipeline get a `Namespace` in their `base/`
//! directory plus an `overlays/kustomization.yaml` pointing back at it, which
//! is the path their ArgoCD Applications sync from.

use std::collections::BTreeMap;

use argoform_core::config::{Environment, Manifest, PipelineConfig};
use argoform_core::meta::{self, ARGOCD_MANAGED_BY_LABEL, VCS_URI_ANNOTATION};
use argoform_core::paths::{self, KUSTOMIZATION};
use argoform_core::resources::{Kustomization, ResourceSet};
use k8s_openapi::api::core::v1::Namespace;

use crate::error::Result;

/// Logical namespace names created for a default manifest
pub const LOGICAL_NAMES: [&str; 3] = ["dev", "stage", "cicd"];

/// Map the logical namespace names to their prefixed names
///
/// ```
/// let names = argoform_pipelines::namespaces::names_with_prefix("tst-");
/// assert_eq!(names["cicd"], "tst-cicd");
/// ```
pub fn names_with_prefix(prefix: &str) -> BTreeMap<String, String> {
    LOGICAL_NAMES
        .iter()
        .map(|name| (name.to_string(), format!("{}{}", prefix, name)))
        .collect()
}

/// Namespace annotated with the GitOps repository it comes from
///
/// The repository annotation is only set when `gitops_url` is non-empty.
pub fn create(name: &str, gitops_url: &str, managed_by: &str) -> Namespace {
    let mut metadata = meta::object_meta(name);
    if !gitops_url.is_empty() {
        meta::add_annotations(
            &mut metadata,
            [(VCS_URI_ANNOTATION, format!("{}?ref=HEAD", gitops_url))],
        );
    }
    meta::add_labels(&mut metadata, [(ARGOCD_MANAGED_BY_LABEL, managed_by)]);
    Namespace {
        metadata,
        ..Default::default()
    }
}

/// Namespaces for a set of names, in the map's order
pub fn namespaces(names: &BTreeMap<String, String>, gitops_url: &str, managed_by: &str) -> Vec<Namespace> {
    names
        .values()
        .map(|name| create(name, gitops_url, managed_by))
        .collect()
}

/// Namespace file of an environment
pub fn environment_namespace_path(env: &Environment) -> String {
    paths::join([
        paths::environment_resources(env),
        "base".to_string(),
        format!("{}-environment.yaml", env.name),
    ])
}

/// Namespace file of the CI/CD pipeline
pub fn pipelines_namespace_path(pipelines: &PipelineConfig) -> String {
    paths::join([
        paths::pipelines(pipelines),
        "base".to_string(),
        format!("{}-environment.yaml", pipelines.name),
    ])
}

/// Build the environment and CI/CD namespaces with their overlays
pub fn build(manifest: &Manifest) -> Result<ResourceSet> {
    let managed_by = manifest.argocd_namespace();
    let mut files = ResourceSet::new();

    for env in &manifest.environments {
        files.insert(
            environment_namespace_path(env),
            create(&env.name, &manifest.gitops_url, managed_by),
        )?;
        add_overlay(&mut files, &paths::environment_resources(env))?;
    }

    if let Some(pipelines) = &manifest.config.pipelines {
        files.insert(
            pipelines_namespace_path(pipelines),
            create(&pipelines.name, &manifest.gitops_url, managed_by),
        )?;
        add_overlay(&mut files, &paths::pipelines(pipelines))?;
    }

    Ok(files)
}

fn add_overlay(files: &mut ResourceSet, dir: &str) -> Result<()> {
    files.insert(
        paths::join([dir, "overlays", KUSTOMIZATION]),
        Kustomization::new(vec!["../base".to_string()]),
    )?;
    Ok(())
}

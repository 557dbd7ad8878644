//! Top-level manifest synthesis

use argoform_core::config::Manifest;
use argoform_core::resources::ResourceSet;
use argoform_scm::{DriverIdentifier, add_git_suffix_if_necessary};

use crate::error::Result;
use crate::{argocd, eventlisteners, namespaces};

/// Build every resource of the GitOps repository described by `manifest`
///
/// The namespace, ArgoCD and event listener sets are built independently and
/// merged; a path produced twice fails the build. A `kustomization.yaml` is
/// then added to every directory lacking one.
pub fn build(manifest: &Manifest) -> Result<ResourceSet> {
    manifest.validate()?;
    let identifier = driver_identifier(manifest)?;

    tracing::info!(
        environments = manifest.environments.len(),
        gitops_url = %manifest.gitops_url,
        "building GitOps resources"
    );

    let files = namespaces::build(manifest)?
        .merge(argocd::build(
            manifest.argocd_namespace(),
            &manifest.gitops_url,
            manifest,
        )?)?
        .merge(eventlisteners::build(manifest, &identifier)?)?
        .with_kustomizations()?;

    tracing::info!(resources = files.len(), "built GitOps resources");
    Ok(files)
}

/// Starting manifest for a new GitOps repository
///
/// The repository URL is normalized to end in `.git`.
pub fn bootstrap_manifest(prefix: &str, gitops_url: &str) -> Manifest {
    let gitops_url = add_git_suffix_if_necessary(gitops_url);
    tracing::debug!(prefix, gitops_url = %gitops_url, "bootstrapping manifest");
    Manifest::bootstrap(prefix, gitops_url)
}

/// Provider identification for the manifest's repositories
///
/// `privateRepoDriver` maps the GitOps repository's host to the named driver
/// on top of the public hosts.
pub fn driver_identifier(manifest: &Manifest) -> Result<DriverIdentifier> {
    match manifest.config.private_repo_driver.as_deref() {
        Some(driver) if !driver.is_empty() && !manifest.gitops_url.is_empty() => {
            Ok(DriverIdentifier::for_private_repo(&manifest.gitops_url, driver)?)
        }
        _ => Ok(DriverIdentifier::new()),
    }
}

//! ArgoCD Application generation
//!
//! Every environment gets an `<env>-env-app.yaml` syncing its environment
//! resources and every application an `<env>-<app>-app.yaml`. When an ArgoCD
//! namespace is configured, `argo-app.yaml` (the ArgoCD directory itself) and,
//! with a pipeline configured, `cicd-app.yaml` are added. All files land in
//! `config/argocd/` next to a sorted `kustomization.yaml`.

use argoform_core::config::{self, Application as AppConfig, Environment, Manifest};
use argoform_core::meta::{self, APP_NAME_LABEL};
use argoform_core::paths;
use argoform_core::resources::{
    Application, ApplicationDestination, ApplicationSource, ApplicationSpec,
    ResourceIgnoreDifferences, ResourceSet, SyncPolicy,
};
use argoform_core::walk::{Visitor, walk};

use crate::error::{PipelineError, Result};

/// Name of the Application managing the ArgoCD directory
pub const ARGO_APP: &str = "argo-app";

/// Name of the Application managing the CI/CD pipelines
pub const CICD_APP: &str = "cicd-app";

const DEFAULT_PROJECT: &str = "default";

/// Controller-managed fields ArgoCD must not treat as drift
fn ignore_differences_fields() -> Vec<ResourceIgnoreDifferences> {
    vec![
        ResourceIgnoreDifferences::new("argoproj.io", "Application", &["/status"]),
        ResourceIgnoreDifferences::new("triggers.tekton.dev", "EventListener", &["/status"]),
        ResourceIgnoreDifferences::new("triggers.tekton.dev", "TriggerTemplate", &["/status"]),
        ResourceIgnoreDifferences::new("triggers.tekton.dev", "TriggerBinding", &["/status"]),
        ResourceIgnoreDifferences::new("route.openshift.io", "Route", &["/spec/host"]),
    ]
}

/// File name of an application's ArgoCD Application
pub fn application_file(env: &Environment, app: &AppConfig) -> String {
    format!("{}-{}-app.yaml", env.name, app.name)
}

/// File name of an environment's ArgoCD Application
pub fn environment_file(env: &Environment) -> String {
    format!("{}-env-app.yaml", env.name)
}

/// Build the ArgoCD Applications for a manifest
///
/// Nothing is generated without a repository URL.
pub fn build(argo_ns: &str, repo_url: &str, manifest: &Manifest) -> Result<ResourceSet> {
    if repo_url.is_empty() {
        tracing::debug!("no GitOps repository URL, skipping ArgoCD applications");
        return Ok(ResourceSet::new());
    }

    let mut builder = ArgoCdBuilder {
        repo_url,
        argo_ns,
        files: ResourceSet::new(),
    };
    walk(manifest, &mut builder)?;

    let mut files = builder.files;
    bootstrap_applications(manifest, repo_url, &mut files)?;
    if !files.is_empty() {
        files.add_kustomization(&paths::argocd())?;
    }
    Ok(files)
}

struct ArgoCdBuilder<'a> {
    repo_url: &'a str,
    argo_ns: &'a str,
    files: ResourceSet,
}

impl Visitor for ArgoCdBuilder<'_> {
    type Error = PipelineError;

    fn visit_environment(&mut self, env: &Environment) -> Result<()> {
        let filename = paths::join([paths::argocd(), environment_file(env)]);
        let application = make_application(
            None,
            &format!("{}-env", env.name),
            self.argo_ns,
            &env.name,
            env.cluster(),
            environment_source(env, self.repo_url),
        );
        self.files.insert(filename, application)?;
        Ok(())
    }

    fn visit_application(&mut self, env: &Environment, app: &AppConfig) -> Result<()> {
        let filename = paths::join([paths::argocd(), application_file(env, app)]);
        let application = make_application(
            Some(&app.name),
            &format!("{}-{}", env.name, app.name),
            self.argo_ns,
            &env.name,
            env.cluster(),
            application_source(env, app, self.repo_url),
        );
        self.files.insert(filename, application)?;
        Ok(())
    }
}

fn bootstrap_applications(manifest: &Manifest, repo_url: &str, files: &mut ResourceSet) -> Result<()> {
    let Some(argocd) = manifest.argocd_config() else {
        tracing::debug!("no ArgoCD namespace configured, skipping bootstrap applications");
        return Ok(());
    };
    let base_path = paths::argocd();

    let argo_app = make_application(
        None,
        ARGO_APP,
        &argocd.namespace,
        &argocd.namespace,
        config::DEFAULT_SERVER,
        ApplicationSource {
            repo_url: repo_url.to_string(),
            path: base_path.clone(),
            ..Default::default()
        },
    );
    files.insert(
        paths::join([base_path.as_str(), "argo-app.yaml"]),
        with_ignore_differences(argo_app),
    )?;

    if let Some(pipelines) = &manifest.config.pipelines {
        let cicd_app = make_application(
            None,
            CICD_APP,
            &argocd.namespace,
            &pipelines.name,
            config::DEFAULT_SERVER,
            ApplicationSource {
                repo_url: repo_url.to_string(),
                path: paths::join([paths::pipelines(pipelines), "overlays".to_string()]),
                ..Default::default()
            },
        );
        files.insert(
            paths::join([base_path.as_str(), "cicd-app.yaml"]),
            with_ignore_differences(cicd_app),
        )?;
    }
    Ok(())
}

/// Source for an application: its external config repository when set,
/// otherwise the overlays directory inside the GitOps repository
pub fn application_source(env: &Environment, app: &AppConfig, repo_url: &str) -> ApplicationSource {
    match &app.config_repo {
        Some(config_repo) => ApplicationSource {
            repo_url: config_repo.url.clone(),
            path: config_repo.path.clone(),
            target_revision: config_repo.target_revision.clone(),
        },
        None => ApplicationSource {
            repo_url: repo_url.to_string(),
            path: paths::join([paths::application(env, app), "overlays".to_string()]),
            ..Default::default()
        },
    }
}

fn environment_source(env: &Environment, repo_url: &str) -> ApplicationSource {
    ApplicationSource {
        repo_url: repo_url.to_string(),
        path: paths::join([paths::environment_resources(env), "overlays".to_string()]),
        ..Default::default()
    }
}

fn with_ignore_differences(mut app: Application) -> Application {
    app.spec.ignore_differences = ignore_differences_fields();
    app
}

fn make_application(
    app_label: Option<&str>,
    name: &str,
    argo_ns: &str,
    dest_ns: &str,
    server: &str,
    source: ApplicationSource,
) -> Application {
    let mut application = Application::new(
        name,
        ApplicationSpec {
            project: DEFAULT_PROJECT.to_string(),
            source,
            destination: ApplicationDestination {
                namespace: dest_ns.to_string(),
                server: server.to_string(),
            },
            sync_policy: Some(SyncPolicy::automated()),
            ignore_differences: Vec::new(),
        },
    );
    application.metadata = meta::namespaced(argo_ns, name);
    if let Some(label) = app_label {
        meta::add_labels(&mut application.metadata, [(APP_NAME_LABEL, label)]);
    }
    application
}

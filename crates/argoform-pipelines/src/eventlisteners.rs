//! Tekton EventListener assembly
//!
//! The listener is provider-agnostic: it takes triggers already built by
//! [`Repository::create_push_trigger`] and lists them in the order supplied.
//! [`build`] produces the CI/CD listener for a manifest together with one
//! push TriggerBinding per git provider in use.

use std::collections::BTreeMap;

use argoform_core::config::{Application, Environment, Manifest, PipelineConfig};
use argoform_core::meta;
use argoform_core::paths;
use argoform_core::resources::{
    EventListener, EventListenerSpec, EventListenerTrigger, ResourceSet, TriggerBinding,
};
use argoform_core::walk::{Visitor, walk};
use argoform_scm::{DriverIdentifier, Repository};

use crate::error::{PipelineError, Result};

/// Name of the CI/CD EventListener
pub const EVENT_LISTENER_NAME: &str = "cicd-event-listener";

/// Trigger running the dry-run pipeline on pushes to the GitOps repository
pub const GITOPS_TRIGGER_NAME: &str = "ci-dryrun-from-push";

/// Compose an EventListener from triggers, preserving their order
pub fn create_el_from_triggers(
    namespace: &str,
    service_account: &str,
    triggers: Vec<EventListenerTrigger>,
) -> EventListener {
    let mut listener = EventListener::new(
        EVENT_LISTENER_NAME,
        EventListenerSpec {
            service_account_name: service_account.to_string(),
            triggers,
        },
    );
    listener.metadata = meta::namespaced(namespace, EVENT_LISTENER_NAME);
    listener
}

/// EventListener firing `template` on pushes to the GitOps repository
pub fn generate(
    repo: &Repository,
    namespace: &str,
    service_account: &str,
    secret_name: &str,
    template: &str,
) -> Result<EventListener> {
    let trigger = repo.create_push_trigger(
        GITOPS_TRIGGER_NAME,
        secret_name,
        namespace,
        template,
        &[repo.push_binding_name()],
    )?;
    Ok(create_el_from_triggers(namespace, service_account, vec![trigger]))
}

/// Name of the trigger for an application's source repository
pub fn application_trigger_name(env: &Environment, app: &Application) -> String {
    format!("{}-{}-push", env.name, app.name)
}

/// Build the CI/CD EventListener and push bindings
///
/// Nothing is generated without a pipeline configuration or a GitOps URL.
pub fn build(manifest: &Manifest, identifier: &DriverIdentifier) -> Result<ResourceSet> {
    let Some(pipelines) = &manifest.config.pipelines else {
        tracing::debug!("no pipelines configured, skipping event listener");
        return Ok(ResourceSet::new());
    };
    if manifest.gitops_url.is_empty() {
        tracing::debug!("no GitOps repository URL, skipping event listener");
        return Ok(ResourceSet::new());
    }

    let gitops_repo = Repository::new(&manifest.gitops_url, identifier)?;
    let mut builder = TriggerBuilder {
        pipelines,
        identifier,
        bindings: BTreeMap::new(),
        triggers: Vec::new(),
    };
    builder.add_binding(&gitops_repo);
    builder.triggers.push(gitops_repo.create_push_trigger(
        GITOPS_TRIGGER_NAME,
        &pipelines.secret_name,
        &pipelines.name,
        &pipelines.template,
        &[gitops_repo.push_binding_name()],
    )?);
    walk(manifest, &mut builder)?;

    let base = paths::join([paths::pipelines(pipelines), "base".to_string()]);
    let mut files = ResourceSet::new();
    for (name, binding) in builder.bindings {
        files.insert(paths::join([base.clone(), format!("{}.yaml", name)]), binding)?;
    }
    let listener = create_el_from_triggers(
        &pipelines.name,
        &pipelines.service_account,
        builder.triggers,
    );
    files.insert(
        paths::join([base, format!("{}.yaml", EVENT_LISTENER_NAME)]),
        listener,
    )?;
    Ok(files)
}

/// Collects one push trigger per application with a source repository
struct TriggerBuilder<'a> {
    pipelines: &'a PipelineConfig,
    identifier: &'a DriverIdentifier,
    bindings: BTreeMap<String, TriggerBinding>,
    triggers: Vec<EventListenerTrigger>,
}

impl TriggerBuilder<'_> {
    /// Bindings are shared by every repository on the same provider
    fn add_binding(&mut self, repo: &Repository) {
        let name = repo.push_binding_name();
        if !self.bindings.contains_key(&name) {
            let (binding, name) = repo.create_push_binding(&self.pipelines.name);
            self.bindings.insert(name, binding);
        }
    }
}

impl Visitor for TriggerBuilder<'_> {
    type Error = PipelineError;

    fn visit_environment(&mut self, _env: &Environment) -> Result<()> {
        Ok(())
    }

    fn visit_application(&mut self, env: &Environment, app: &Application) -> Result<()> {
        let Some(source_url) = app.source_url.as_deref().filter(|url| !url.is_empty()) else {
            return Ok(());
        };

        let repo = Repository::new(source_url, self.identifier)?;
        self.add_binding(&repo);
        let trigger = repo.create_push_trigger(
            &application_trigger_name(env, app),
            &app.webhook_secret_name(env),
            &self.pipelines.name,
            &self.pipelines.app_template,
            &[repo.push_binding_name()],
        )?;
        self.triggers.push(trigger);
        Ok(())
    }
}

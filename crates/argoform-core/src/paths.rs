//! Canonical relative paths for generated directories
//!
//! All paths are slash-separated regardless of the host platform, since the
//! output is committed to git.
//!
//! ```text
//! config/argocd/                         ArgoCD Applications
//! config/<cicd>/{base,overlays}/         CI/CD namespace, event listener, bindings
//! environments/<env>/env/{base,overlays}/ environment namespace
//! environments/<env>/apps/<app>/         application manifests
//! ```

use crate::config::{Application, Environment, PipelineConfig};

/// Name of the aggregator file written into each generated directory
pub const KUSTOMIZATION: &str = "kustomization.yaml";

/// Join path segments with `/`, skipping empty segments and stray separators
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .flat_map(|segment| {
            to_slash(segment.as_ref())
                .split('/')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Normalize OS path separators to forward slashes
pub fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

/// Directory holding the ArgoCD Applications
pub fn argocd() -> String {
    join(["config", "argocd"])
}

/// Directory holding the CI/CD pipeline resources
pub fn pipelines(pipelines: &PipelineConfig) -> String {
    join(["config", pipelines.name.as_str()])
}

/// Directory holding an environment's resources
pub fn environment(env: &Environment) -> String {
    join(["environments", env.name.as_str()])
}

/// Directory holding an application's manifests inside the GitOps repository
pub fn application(env: &Environment, app: &Application) -> String {
    join([
        environment(env).as_str(),
        "apps",
        app.name.as_str(),
    ])
}

/// Directory holding environment-scoped resources such as the namespace
pub fn environment_resources(env: &Environment) -> String {
    join([environment(env).as_str(), "env"])
}

/// Last path component
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Everything before the last path component, empty for top-level files
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

//! Hierarchical GitOps configuration model
//!
//! A [`Manifest`] is the root of the tree: global [`Config`], the GitOps
//! repository URL and an ordered list of [`Environment`]s, each holding an
//! ordered list of [`Application`]s. Declaration order is preserved and is the
//! order in which [`crate::walk`] visits entities.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Default namespace for ArgoCD installations
pub const ARGOCD_NAMESPACE: &str = "openshift-gitops";

/// In-cluster API server address used when an environment has no cluster
pub const DEFAULT_SERVER: &str = "https://kubernetes.default.svc";

/// Root configuration describing every environment and the global settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Global settings
    #[serde(default)]
    pub config: Config,

    /// GitOps repository URL
    #[serde(default, rename = "gitopsURL")]
    pub gitops_url: String,

    /// Environments in declaration order
    #[serde(default)]
    pub environments: Vec<Environment>,
}

/// Global configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Prefix applied to generated namespace names
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    /// ArgoCD installation settings
    #[serde(default, rename = "argocd", skip_serializing_if = "Option::is_none")]
    pub argocd: Option<ArgoCdConfig>,

    /// CI/CD pipeline settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<PipelineConfig>,

    /// Driver (`github` or `gitlab`) for a GitOps repository on a custom host
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_repo_driver: Option<String>,
}

/// ArgoCD installation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgoCdConfig {
    pub namespace: String,
}

impl Default for ArgoCdConfig {
    fn default() -> Self {
        Self {
            namespace: ARGOCD_NAMESPACE.to_string(),
        }
    }
}

/// CI/CD pipeline settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    /// Namespace the CI/CD resources live in
    pub name: String,

    /// Service account the EventListener runs as
    #[serde(default = "default_service_account")]
    pub service_account: String,

    /// Secret holding the GitOps repository webhook secret
    #[serde(default = "default_secret_name")]
    pub secret_name: String,

    /// TriggerTemplate fired by pushes to the GitOps repository
    #[serde(default = "default_template")]
    pub template: String,

    /// TriggerTemplate fired by pushes to application source repositories
    #[serde(default = "default_app_template")]
    pub app_template: String,
}

fn default_service_account() -> String {
    "pipeline".to_string()
}

fn default_secret_name() -> String {
    "gitops-webhook-secret".to_string()
}

fn default_template() -> String {
    "ci-dryrun-from-push-template".to_string()
}

fn default_app_template() -> String {
    "app-ci-template".to_string()
}

impl PipelineConfig {
    /// Create pipeline settings for a namespace with default names elsewhere
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_account: default_service_account(),
            secret_name: default_secret_name(),
            template: default_template(),
            app_template: default_app_template(),
        }
    }
}

/// A deployment target grouping applications
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub name: String,

    /// Cluster API server, the in-cluster address when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,

    /// Applications in declaration order
    #[serde(default)]
    pub apps: Vec<Application>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper for appending an application
    pub fn with_app(mut self, app: Application) -> Self {
        self.apps.push(app);
        self
    }

    /// Destination server for this environment
    pub fn cluster(&self) -> &str {
        match self.cluster.as_deref() {
            Some(cluster) if !cluster.is_empty() => cluster,
            _ => DEFAULT_SERVER,
        }
    }

    pub fn get_application(&self, name: &str) -> Option<&Application> {
        self.apps.iter().find(|a| a.name == name)
    }
}

/// An application deployed into an environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub name: String,

    /// External configuration repository, replacing the in-repo path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_repo: Option<ConfigRepo>,

    /// Source repository whose pushes trigger CI
    #[serde(default, rename = "sourceURL", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Secret holding the source repository webhook secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Name of the webhook secret for this application's source repository
    pub fn webhook_secret_name(&self, env: &Environment) -> String {
        self.webhook_secret
            .clone()
            .unwrap_or_else(|| format!("webhook-secret-{}-{}", env.name, self.name))
    }
}

/// External repository holding an application's configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRepo {
    pub url: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub target_revision: String,
}

impl Manifest {
    /// Default manifest: `dev` and `stage` environments plus a `cicd` pipeline
    /// namespace, all prefixed, managed by the default ArgoCD installation.
    pub fn bootstrap(prefix: &str, gitops_url: impl Into<String>) -> Self {
        let prefix = normalize_prefix(prefix);
        Self {
            config: Config {
                prefix: prefix.clone(),
                argocd: Some(ArgoCdConfig::default()),
                pipelines: Some(PipelineConfig::new(format!("{}cicd", prefix))),
                private_repo_driver: None,
            },
            gitops_url: gitops_url.into(),
            environments: vec![
                Environment::new(format!("{}dev", prefix)),
                Environment::new(format!("{}stage", prefix)),
            ],
        }
    }

    /// Parse a manifest from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Load a manifest from a file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Save the manifest to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the naming invariants of the tree
    ///
    /// Environment, application and pipeline names end up in namespace names
    /// and output paths, so each must be an RFC 1123 label. The ArgoCD
    /// Application names derived from them (`<env>-env`, `<env>-<app>`) must
    /// also be unique across the whole manifest.
    pub fn validate(&self) -> Result<()> {
        let mut env_names = HashSet::new();
        let mut argocd_names: HashMap<String, String> = HashMap::new();

        for env in &self.environments {
            check_name("environment", &env.name)?;
            if !env_names.insert(env.name.as_str()) {
                return Err(CoreError::DuplicateEnvironment {
                    name: env.name.clone(),
                });
            }
            claim_argocd_name(
                &mut argocd_names,
                format!("{}-env", env.name),
                format!("environment '{}'", env.name),
            )?;

            let mut app_names = HashSet::new();
            for app in &env.apps {
                check_name(&format!("environment '{}' application", env.name), &app.name)?;
                if !app_names.insert(app.name.as_str()) {
                    return Err(CoreError::DuplicateApplication {
                        environment: env.name.clone(),
                        name: app.name.clone(),
                    });
                }
                claim_argocd_name(
                    &mut argocd_names,
                    format!("{}-{}", env.name, app.name),
                    format!("application '{}' in environment '{}'", app.name, env.name),
                )?;
            }
        }

        if let Some(pipelines) = &self.config.pipelines {
            check_name("pipelines", &pipelines.name)?;
        }

        Ok(())
    }

    /// ArgoCD settings, treating an empty namespace as unconfigured
    pub fn argocd_config(&self) -> Option<&ArgoCdConfig> {
        self.config
            .argocd
            .as_ref()
            .filter(|argocd| !argocd.namespace.is_empty())
    }

    /// Namespace ArgoCD Applications are created in
    pub fn argocd_namespace(&self) -> &str {
        self.argocd_config()
            .map(|argocd| argocd.namespace.as_str())
            .unwrap_or(ARGOCD_NAMESPACE)
    }

    pub fn get_environment(&self, name: &str) -> Option<&Environment> {
        self.environments.iter().find(|e| e.name == name)
    }
}

static DNS_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid regex"));

/// Longest name Kubernetes accepts for a namespace
pub const MAX_NAME_LENGTH: usize = 63;

/// Check a name is a non-empty RFC 1123 label
fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidConfig {
            message: format!("{} name must not be empty", kind),
        });
    }
    if name.len() > MAX_NAME_LENGTH || !DNS_LABEL_RE.is_match(name) {
        return Err(CoreError::InvalidConfig {
            message: format!(
                "{} name '{}' must consist of lowercase alphanumerics or '-', start and end \
                 with an alphanumeric and be at most {} characters",
                kind, name, MAX_NAME_LENGTH
            ),
        });
    }
    Ok(())
}

/// Record the owner of a derived ArgoCD Application name
fn claim_argocd_name(
    claimed: &mut HashMap<String, String>,
    name: String,
    owner: String,
) -> Result<()> {
    if let Some(previous) = claimed.get(&name) {
        return Err(CoreError::InvalidConfig {
            message: format!(
                "ArgoCD application name '{}' is generated for both {} and {}",
                name, previous, owner
            ),
        });
    }
    claimed.insert(name, owner);
    Ok(())
}

/// Ensure a non-empty prefix ends with `-`
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('-') {
        prefix.to_string()
    } else {
        format!("{}-", prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = Manifest::from_yaml(
            r#"
gitopsURL: https://github.com/example/gitops.git
config:
  argocd:
    namespace: argocd
  pipelines:
    name: cicd
environments:
  - name: dev
    cluster: https://dev.example.com
    apps:
      - name: taxi
      - name: bus
        configRepo:
          url: https://github.com/example/bus-config.git
          path: deploy
          targetRevision: main
  - name: stage
"#,
        )
        .unwrap();

        assert_eq!(manifest.gitops_url, "https://github.com/example/gitops.git");
        assert_eq!(manifest.argocd_namespace(), "argocd");
        let pipelines = manifest.config.pipelines.as_ref().unwrap();
        assert_eq!(pipelines.name, "cicd");
        assert_eq!(pipelines.service_account, "pipeline");
        assert_eq!(pipelines.secret_name, "gitops-webhook-secret");

        let names: Vec<_> = manifest.environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "stage"]);

        let dev = manifest.get_environment("dev").unwrap();
        assert_eq!(dev.cluster(), "https://dev.example.com");
        let bus = dev.get_application("bus").unwrap();
        assert_eq!(bus.config_repo.as_ref().unwrap().target_revision, "main");
        assert!(dev.get_application("taxi").unwrap().config_repo.is_none());

        assert_eq!(manifest.get_environment("stage").unwrap().cluster(), DEFAULT_SERVER);
    }

    #[test]
    fn test_empty_cluster_uses_default_server() {
        let env = Environment {
            name: "dev".to_string(),
            cluster: Some(String::new()),
            apps: vec![],
        };
        assert_eq!(env.cluster(), DEFAULT_SERVER);
    }

    #[test]
    fn test_validate_rejects_duplicate_environments() {
        let manifest = Manifest {
            environments: vec![Environment::new("dev"), Environment::new("dev")],
            ..Default::default()
        };
        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, CoreError::DuplicateEnvironment { name } if name == "dev"));
    }

    #[test]
    fn test_validate_rejects_duplicate_applications() {
        let manifest = Manifest {
            environments: vec![
                Environment::new("dev")
                    .with_app(Application::new("taxi"))
                    .with_app(Application::new("taxi")),
            ],
            ..Default::default()
        };
        let err = manifest.validate().unwrap_err();
        assert!(matches!(
            err,
            CoreError::DuplicateApplication { environment, name } if environment == "dev" && name == "taxi"
        ));
    }

    #[test]
    fn test_same_application_name_in_different_environments() {
        let manifest = Manifest {
            environments: vec![
                Environment::new("dev").with_app(Application::new("taxi")),
                Environment::new("stage").with_app(Application::new("taxi")),
            ],
            ..Default::default()
        };
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_bootstrap_manifest() {
        let manifest = Manifest::bootstrap("tst", "https://github.com/org/gitops.git");
        assert_eq!(manifest.config.prefix, "tst-");
        let names: Vec<_> = manifest.environments.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["tst-dev", "tst-stage"]);
        assert_eq!(manifest.config.pipelines.as_ref().unwrap().name, "tst-cicd");
        assert_eq!(manifest.argocd_namespace(), ARGOCD_NAMESPACE);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_empty_argocd_namespace_is_unconfigured() {
        let mut manifest = Manifest::default();
        manifest.config.argocd = Some(ArgoCdConfig {
            namespace: String::new(),
        });
        assert!(manifest.argocd_config().is_none());
        assert_eq!(manifest.argocd_namespace(), ARGOCD_NAMESPACE);
    }

    #[test]
    fn test_webhook_secret_name() {
        let env = Environment::new("dev");
        let mut app = Application::new("taxi");
        assert_eq!(app.webhook_secret_name(&env), "webhook-secret-dev-taxi");
        app.webhook_secret = Some("custom".to_string());
        assert_eq!(app.webhook_secret_name(&env), "custom");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("pipelines.yaml");
        let manifest = Manifest::bootstrap("", "https://gitlab.com/org/gitops.git");

        manifest.save_to(&path).unwrap();
        let loaded = Manifest::load_from(&path).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_validate_rejects_path_like_names() {
        let mut manifest = Manifest::bootstrap("", "https://github.com/org/gitops.git");
        manifest.environments.push(Environment::new("../../../escaped"));

        let err = manifest.validate().unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidConfig { ref message } if message.starts_with("environment name '../../../escaped'")
        ));
    }

    #[test]
    fn test_validate_name_shapes() {
        let with_env = |name: &str| Manifest {
            environments: vec![Environment::new(name)],
            ..Default::default()
        };

        let longest = "x".repeat(MAX_NAME_LENGTH);
        let too_long = "x".repeat(MAX_NAME_LENGTH + 1);

        for valid in ["dev", "tst-dev", "a", "0-stage-1", longest.as_str()] {
            assert!(with_env(valid).validate().is_ok(), "{}", valid);
        }
        for invalid in ["Dev", "-dev", "dev-", "dev.test", "dev/apps", ".", "", too_long.as_str()] {
            assert!(
                matches!(with_env(invalid).validate(), Err(CoreError::InvalidConfig { .. })),
                "{}",
                invalid
            );
        }
    }

    #[test]
    fn test_validate_rejects_invalid_application_and_pipelines_names() {
        let manifest = Manifest {
            environments: vec![Environment::new("dev").with_app(Application::new("../taxi"))],
            ..Default::default()
        };
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("environment 'dev' application name '../taxi'"), "{}", err);

        let mut manifest = Manifest::bootstrap("", "");
        manifest.config.pipelines = Some(PipelineConfig::new("ci/cd"));
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("pipelines name 'ci/cd'"), "{}", err);

        manifest.config.pipelines = Some(PipelineConfig::new(""));
        let err = manifest.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: pipelines name must not be empty");
    }

    #[test]
    fn test_validate_rejects_clashing_argocd_names() {
        let manifest = Manifest {
            environments: vec![Environment::new("dev").with_app(Application::new("env"))],
            ..Default::default()
        };
        let err = manifest.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ArgoCD application name 'dev-env' is generated for both \
             environment 'dev' and application 'env' in environment 'dev'"
        );

        let manifest = Manifest {
            environments: vec![
                Environment::new("a-b").with_app(Application::new("c")),
                Environment::new("a").with_app(Application::new("b-c")),
            ],
            ..Default::default()
        };
        let err = manifest.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: ArgoCD application name 'a-b-c' is generated for both \
             application 'c' in environment 'a-b' and application 'b-c' in environment 'a'"
        );
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("tst"), "tst-");
        assert_eq!(normalize_prefix("tst-"), "tst-");
    }
}

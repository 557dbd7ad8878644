//! Git host webhooks for the CI/CD EventListener
//!
//! A webhook is created per repository scope: the GitOps repository itself
//! ([`WebhookScope::Cicd`]) or an application's source repository. The git
//! host calls are delegated to a [`WebhookClient`]; this module only decides
//! which repository and secret a scope maps to.
//!
//! ## Example
//!
//! ```rust,no_run
//! use argoform_core::Manifest;
//! use argoform_pipelines::webhook::{self, MockWebhookClient, WebhookScope};
//!
//! # async fn example() -> argoform_pipelines::Result<()> {
//! let manifest = Manifest::bootstrap("", "https://github.com/org/gitops.git");
//! let client = MockWebhookClient::new();
//! let id = webhook::create(
//!     &client,
//!     &manifest,
//!     &WebhookScope::Cicd,
//!     "https://listener.example.com",
//!     "s3cr3t",
//! )
//! .await?;
//! # let _ = id;
//! # Ok(())
//! # }
//! ```

mod mock;

pub use mock::{MockWebhook, MockWebhookClient, WebhookCounts};

use async_trait::async_trait;
use std::fmt;

use argoform_core::config::Manifest;
use argoform_scm::Repository;

use crate::build::driver_identifier;
use crate::error::{PipelineError, Result};

/// Git host operations needed to manage push webhooks
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait WebhookClient: Send + Sync {
    /// Ids of the webhooks on `repo_url` delivering to `listener_url`
    async fn list_webhooks(&self, repo_url: &str, listener_url: &str) -> Result<Vec<String>>;

    /// Register a push webhook and return its id
    async fn push_webhook(&self, repo_url: &str, listener_url: &str, secret: &str) -> Result<String>;

    /// Remove a webhook by id
    async fn delete_webhook(&self, repo_url: &str, id: &str) -> Result<()>;
}

/// Repository scope a webhook belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookScope {
    /// The GitOps repository, triggering the dry-run pipeline
    Cicd,
    /// An application's source repository
    Application { env: String, app: String },
}

impl fmt::Display for WebhookScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cicd => f.write_str("CI/CD"),
            Self::Application { env, app } => {
                write!(f, "application '{}' in environment '{}'", app, env)
            }
        }
    }
}

/// Repository and webhook secret resolved for a scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookTarget {
    pub repo_url: String,
    /// Name of the Secret the EventListener verifies deliveries against
    pub secret_name: String,
}

/// Find the repository and secret name of a webhook scope
pub fn resolve_target(manifest: &Manifest, scope: &WebhookScope) -> Result<WebhookTarget> {
    match scope {
        WebhookScope::Cicd => {
            let pipelines = manifest.config.pipelines.as_ref().ok_or_else(|| {
                PipelineError::NotFound {
                    what: "pipelines configuration".to_string(),
                }
            })?;
            if manifest.gitops_url.is_empty() {
                return Err(PipelineError::NotFound {
                    what: "GitOps repository URL".to_string(),
                });
            }
            Ok(WebhookTarget {
                repo_url: manifest.gitops_url.clone(),
                secret_name: pipelines.secret_name.clone(),
            })
        }
        WebhookScope::Application { env, app } => {
            let environment = manifest.get_environment(env).ok_or_else(|| {
                PipelineError::NotFound {
                    what: format!("environment '{}'", env),
                }
            })?;
            let application = environment.get_application(app).ok_or_else(|| {
                PipelineError::NotFound {
                    what: format!("application '{}' in environment '{}'", app, env),
                }
            })?;
            let source_url = application
                .source_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| PipelineError::NotFound {
                    what: format!("source URL of {}", scope),
                })?;
            Ok(WebhookTarget {
                repo_url: source_url.to_string(),
                secret_name: application.webhook_secret_name(environment),
            })
        }
    }
}

/// Create the webhook for a scope, failing if one already delivers to
/// `listener_url`
pub async fn create(
    client: &dyn WebhookClient,
    manifest: &Manifest,
    scope: &WebhookScope,
    listener_url: &str,
    secret: &str,
) -> Result<String> {
    let target = checked_target(manifest, scope)?;

    let existing = client.list_webhooks(&target.repo_url, listener_url).await?;
    if !existing.is_empty() {
        return Err(PipelineError::Webhook {
            url: target.repo_url,
            message: format!("webhook already exists for {}", listener_url),
        });
    }

    let id = client
        .push_webhook(&target.repo_url, listener_url, secret)
        .await?;
    tracing::info!(scope = %scope, repository = %target.repo_url, id = %id, "created webhook");
    Ok(id)
}

/// Delete every webhook of a scope delivering to `listener_url`
///
/// Returns the removed ids. When a deletion fails, the ids removed before it
/// are carried by [`PipelineError::WebhookDelete`].
pub async fn delete(
    client: &dyn WebhookClient,
    manifest: &Manifest,
    scope: &WebhookScope,
    listener_url: &str,
) -> Result<Vec<String>> {
    let target = checked_target(manifest, scope)?;

    let ids = client.list_webhooks(&target.repo_url, listener_url).await?;
    let mut deleted = Vec::with_capacity(ids.len());
    for id in ids {
        if let Err(error) = client.delete_webhook(&target.repo_url, &id).await {
            tracing::warn!(scope = %scope, repository = %target.repo_url, id = %id, deleted = deleted.len(), "webhook deletion failed");
            return Err(PipelineError::WebhookDelete {
                url: target.repo_url,
                deleted,
                source: Box::new(error),
            });
        }
        tracing::info!(scope = %scope, repository = %target.repo_url, id = %id, "deleted webhook");
        deleted.push(id);
    }
    if deleted.is_empty() {
        tracing::warn!(scope = %scope, repository = %target.repo_url, "no webhook to delete");
    }
    Ok(deleted)
}

/// Resolve a scope and check its repository is on a supported host
fn checked_target(manifest: &Manifest, scope: &WebhookScope) -> Result<WebhookTarget> {
    let target = resolve_target(manifest, scope)?;
    Repository::new(&target.repo_url, &driver_identifier(manifest)?)?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use argoform_core::config::{Application, Environment};
    use argoform_scm::ScmError;

    const LISTENER: &str = "https://gitops-webhook-event-listener.apps.example.com";

    fn manifest() -> Manifest {
        let mut manifest = Manifest::bootstrap("", "https://github.com/org/gitops.git");
        let mut taxi = Application::new("taxi");
        taxi.source_url = Some("https://gitlab.com/org/taxi.git".to_string());
        manifest.environments[0] = Environment::new("dev")
            .with_app(taxi)
            .with_app(Application::new("bus"));
        manifest
    }

    fn app_scope(app: &str) -> WebhookScope {
        WebhookScope::Application {
            env: "dev".to_string(),
            app: app.to_string(),
        }
    }

    #[test]
    fn test_resolve_cicd_target() {
        let target = resolve_target(&manifest(), &WebhookScope::Cicd).unwrap();
        assert_eq!(target.repo_url, "https://github.com/org/gitops.git");
        assert_eq!(target.secret_name, "gitops-webhook-secret");
    }

    #[test]
    fn test_resolve_application_target() {
        let target = resolve_target(&manifest(), &app_scope("taxi")).unwrap();
        assert_eq!(target.repo_url, "https://gitlab.com/org/taxi.git");
        assert_eq!(target.secret_name, "webhook-secret-dev-taxi");
    }

    #[test]
    fn test_resolve_missing_targets() {
        let manifest = manifest();

        let err = resolve_target(&manifest, &app_scope("bus")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "source URL of application 'bus' in environment 'dev' not found"
        );

        let err = resolve_target(&manifest, &app_scope("tram")).unwrap_err();
        assert_eq!(err.to_string(), "application 'tram' in environment 'dev' not found");

        let scope = WebhookScope::Application {
            env: "prod".to_string(),
            app: "taxi".to_string(),
        };
        let err = resolve_target(&manifest, &scope).unwrap_err();
        assert_eq!(err.to_string(), "environment 'prod' not found");

        let mut no_pipelines = manifest.clone();
        no_pipelines.config.pipelines = None;
        assert!(matches!(
            resolve_target(&no_pipelines, &WebhookScope::Cicd),
            Err(PipelineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_create_webhook() {
        let client = MockWebhookClient::new();
        let manifest = manifest();

        let id = create(&client, &manifest, &WebhookScope::Cicd, LISTENER, "s3cr3t")
            .await
            .unwrap();

        let hooks = client.webhooks("https://github.com/org/gitops.git");
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].id, id);
        assert_eq!(hooks[0].listener_url, LISTENER);
        assert_eq!(hooks[0].secret, "s3cr3t");
    }

    #[tokio::test]
    async fn test_create_existing_webhook_fails() {
        let client = MockWebhookClient::new();
        let manifest = manifest();

        create(&client, &manifest, &app_scope("taxi"), LISTENER, "a").await.unwrap();
        let err = create(&client, &manifest, &app_scope("taxi"), LISTENER, "b")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Webhook { ref url, .. } if url == "https://gitlab.com/org/taxi.git"));
        assert_eq!(client.operation_counts().pushes, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_unsupported_host() {
        let client = MockWebhookClient::new();
        let mut manifest = manifest();
        manifest.environments[0].apps[0].source_url =
            Some("https://git.example.com/org/taxi".to_string());

        let err = create(&client, &manifest, &app_scope("taxi"), LISTENER, "s")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Scm(ScmError::UnsupportedProvider { .. })));
        assert_eq!(client.operation_counts().lists, 0);
    }

    #[tokio::test]
    async fn test_delete_webhooks() {
        let client = MockWebhookClient::new();
        let manifest = manifest();
        let repo = "https://github.com/org/gitops.git";

        let first = client.push_webhook(repo, LISTENER, "s").await.unwrap();
        let second = client.push_webhook(repo, LISTENER, "s").await.unwrap();
        client.push_webhook(repo, "https://other.example.com", "s").await.unwrap();

        let deleted = delete(&client, &manifest, &WebhookScope::Cicd, LISTENER)
            .await
            .unwrap();
        assert_eq!(deleted, vec![first, second]);

        let remaining = client.webhooks(repo);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].listener_url, "https://other.example.com");
    }

    /// Client whose deletion of one id always fails
    struct FailingDelete {
        inner: MockWebhookClient,
        failing_id: String,
    }

    #[async_trait]
    impl WebhookClient for FailingDelete {
        async fn list_webhooks(&self, repo_url: &str, listener_url: &str) -> Result<Vec<String>> {
            self.inner.list_webhooks(repo_url, listener_url).await
        }

        async fn push_webhook(&self, repo_url: &str, listener_url: &str, secret: &str) -> Result<String> {
            self.inner.push_webhook(repo_url, listener_url, secret).await
        }

        async fn delete_webhook(&self, repo_url: &str, id: &str) -> Result<()> {
            if id == self.failing_id {
                return Err(PipelineError::Webhook {
                    url: repo_url.to_string(),
                    message: "rate limited".to_string(),
                });
            }
            self.inner.delete_webhook(repo_url, id).await
        }
    }

    #[tokio::test]
    async fn test_delete_reports_removed_ids_on_failure() {
        let repo = "https://github.com/org/gitops.git";
        let inner = MockWebhookClient::new();
        let first = inner.push_webhook(repo, LISTENER, "s").await.unwrap();
        let second = inner.push_webhook(repo, LISTENER, "s").await.unwrap();
        let client = FailingDelete {
            inner,
            failing_id: second.clone(),
        };

        let err = delete(&client, &manifest(), &WebhookScope::Cicd, LISTENER)
            .await
            .unwrap_err();
        match err {
            PipelineError::WebhookDelete { url, deleted, source } => {
                assert_eq!(url, repo);
                assert_eq!(deleted, vec![first]);
                assert!(matches!(*source, PipelineError::Webhook { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let remaining = client.inner.webhooks(repo);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second);
    }

    #[tokio::test]
    async fn test_delete_nothing() {
        let client = MockWebhookClient::new();
        let deleted = delete(&client, &manifest(), &app_scope("taxi"), LISTENER)
            .await
            .unwrap();
        assert!(deleted.is_empty());
        assert_eq!(client.operation_counts().deletes, 0);
    }
}

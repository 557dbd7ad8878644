//! The provider seam: payload shapes and event filters per git host
//!
//! Each host delivers push webhooks with a different payload layout. A
//! [`GitProvider`] maps that layout onto one parameter vocabulary
//! ([`params`]) so trigger templates never need to know the host.

use argoform_core::resources::{InterceptorParam, Param, TriggerInterceptor};
use serde::Serialize;

/// Normalized parameter names produced by every push binding
pub mod params {
    pub const GIT_REPOSITORY_URL: &str = "gitrepositoryurl";
    pub const FULL_NAME: &str = "fullname";
    pub const GIT_REF: &str = "ref";
    pub const GIT_COMMIT_ID: &str = "commit-id";
    pub const GIT_COMMIT_DATE: &str = "commit-date";
    pub const GIT_COMMIT_MESSAGE: &str = "commit-message";
    pub const GIT_COMMIT_AUTHOR: &str = "commit-author";
}

/// Key inside the webhook secret holding the shared token
pub const WEBHOOK_SECRET_KEY: &str = "webhook-secret-key";

/// Name of the CEL interceptor
pub const CEL_INTERCEPTOR: &str = "cel";

/// A derived variable computed by the CEL interceptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CelOverlay {
    pub key: String,
    pub expression: String,
}

impl CelOverlay {
    pub fn new(key: &str, expression: &str) -> Self {
        Self {
            key: key.to_string(),
            expression: expression.to_string(),
        }
    }
}

/// Host-specific webhook handling
pub trait GitProvider: Send + Sync {
    /// Driver name, also the name of the host's ClusterInterceptor
    fn name(&self) -> &'static str;

    /// Whether a repository path (no leading slash, no `.git`) has the
    /// shape this host uses
    fn is_valid_path(&self, path: &str) -> bool;

    /// Payload expressions for the normalized push parameters
    fn push_binding_params(&self) -> Vec<Param>;

    /// CEL expression accepting branch pushes to the repository `full_name`
    fn push_event_filter(&self, full_name: &str) -> String;

    /// CEL variables derived from a push payload
    fn push_overlays(&self) -> Vec<CelOverlay>;

    /// Name of the push TriggerBinding
    fn push_binding_name(&self) -> String {
        format!("{}-push-binding", self.name())
    }

    /// Interceptor verifying the shared webhook secret
    fn secret_interceptor(&self, secret_name: &str) -> TriggerInterceptor {
        TriggerInterceptor::new(
            self.name(),
            vec![InterceptorParam::new("secretRef", secret_ref(secret_name))],
        )
    }
}

/// `secretRef` interceptor parameter value
pub fn secret_ref(secret_name: &str) -> serde_json::Value {
    serde_json::json!({
        "secretName": secret_name,
        "secretKey": WEBHOOK_SECRET_KEY,
    })
}

/// CEL interceptor with a filter and overlays
pub fn cel_interceptor(
    filter: String,
    overlays: &[CelOverlay],
) -> serde_json::Result<TriggerInterceptor> {
    Ok(TriggerInterceptor::new(
        CEL_INTERCEPTOR,
        vec![
            InterceptorParam::new("filter", serde_json::Value::String(filter)),
            InterceptorParam::new("overlays", serde_json::to_value(overlays)?),
        ],
    ))
}

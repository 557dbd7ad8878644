//! In-memory webhook client for testing
//!
//! Stores webhooks per repository URL without talking to a git host.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::WebhookClient;
use crate::error::{PipelineError, Result};

/// A webhook registered on the mock host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWebhook {
    pub id: String,
    pub listener_url: String,
    pub secret: String,
}

/// In-memory webhook client for testing
#[derive(Clone, Default)]
pub struct MockWebhookClient {
    /// repository URL -> webhooks in creation order
    hooks: Arc<RwLock<HashMap<String, Vec<MockWebhook>>>>,
    next_id: Arc<RwLock<u64>>,
    operations: Arc<RwLock<WebhookCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct WebhookCounts {
    pub lists: usize,
    pub pushes: usize,
    pub deletes: usize,
}

impl MockWebhookClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Webhooks registered on a repository
    pub fn webhooks(&self, repo_url: &str) -> Vec<MockWebhook> {
        self.hooks
            .read()
            .unwrap()
            .get(repo_url)
            .cloned()
            .unwrap_or_default()
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> WebhookCounts {
        self.operations.read().unwrap().clone()
    }
}

#[async_trait]
impl WebhookClient for MockWebhookClient {
    async fn list_webhooks(&self, repo_url: &str, listener_url: &str) -> Result<Vec<String>> {
        self.operations.write().unwrap().lists += 1;

        Ok(self
            .webhooks(repo_url)
            .into_iter()
            .filter(|hook| hook.listener_url == listener_url)
            .map(|hook| hook.id)
            .collect())
    }

    async fn push_webhook(&self, repo_url: &str, listener_url: &str, secret: &str) -> Result<String> {
        self.operations.write().unwrap().pushes += 1;

        let id = {
            let mut next = self.next_id.write().unwrap();
            *next += 1;
            next.to_string()
        };
        self.hooks
            .write()
            .unwrap()
            .entry(repo_url.to_string())
            .or_default()
            .push(MockWebhook {
                id: id.clone(),
                listener_url: listener_url.to_string(),
                secret: secret.to_string(),
            });
        Ok(id)
    }

    async fn delete_webhook(&self, repo_url: &str, id: &str) -> Result<()> {
        self.operations.write().unwrap().deletes += 1;

        let mut hooks = self.hooks.write().unwrap();
        let repo_hooks = hooks.entry(repo_url.to_string()).or_default();
        let before = repo_hooks.len();
        repo_hooks.retain(|hook| hook.id != id);
        if repo_hooks.len() == before {
            return Err(PipelineError::Webhook {
                url: repo_url.to_string(),
                message: format!("webhook {} not found", id),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_push_and_list() {
        let client = MockWebhookClient::new();

        let a = client.push_webhook("repo", "https://a", "s").await.unwrap();
        let b = client.push_webhook("repo", "https://b", "s").await.unwrap();
        assert_ne!(a, b);

        assert_eq!(client.list_webhooks("repo", "https://a").await.unwrap(), vec![a]);
        assert!(client.list_webhooks("other", "https://a").await.unwrap().is_empty());

        let counts = client.operation_counts();
        assert_eq!(counts.pushes, 2);
        assert_eq!(counts.lists, 2);
    }

    #[tokio::test]
    async fn test_mock_delete_unknown_fails() {
        let client = MockWebhookClient::new();
        let result = client.delete_webhook("repo", "42").await;
        assert!(matches!(result, Err(PipelineError::Webhook { .. })));
    }
}

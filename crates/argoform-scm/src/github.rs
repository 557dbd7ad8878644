//! GitHub push webhooks

use argoform_core::resources::Param;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::provider::{CelOverlay, GitProvider, params};

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+/[\w.-]+$").expect("valid regex"));

const PUSH_EVENT_FILTER: &str = "(header.match('X-GitHub-Event', 'push') && body.repository.full_name == '{full_name}') && body.ref.startsWith('refs/heads/')";

/// github.com and GitHub Enterprise; repositories are always `owner/repo`
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHub;

impl GitProvider for GitHub {
    fn name(&self) -> &'static str {
        "github"
    }

    fn is_valid_path(&self, path: &str) -> bool {
        PATH_RE.is_match(path)
    }

    fn push_binding_params(&self) -> Vec<Param> {
        vec![
            Param::new(params::GIT_REPOSITORY_URL, "$(body.repository.clone_url)"),
            Param::new(params::FULL_NAME, "$(body.repository.full_name)"),
            Param::new(params::GIT_REF, "$(extensions.ref)"),
            Param::new(params::GIT_COMMIT_ID, "$(body.head_commit.id)"),
            Param::new(params::GIT_COMMIT_DATE, "$(body.head_commit.timestamp)"),
            Param::new(params::GIT_COMMIT_MESSAGE, "$(body.head_commit.message)"),
            Param::new(params::GIT_COMMIT_AUTHOR, "$(body.head_commit.author.name)"),
        ]
    }

    fn push_event_filter(&self, full_name: &str) -> String {
        PUSH_EVENT_FILTER.replace("{full_name}", full_name)
    }

    fn push_overlays(&self) -> Vec<CelOverlay> {
        vec![
            CelOverlay::new("ref", "body.ref.split('/')[2]"),
            CelOverlay::new("short_sha", "body.head_commit.id.truncate(7)"),
        ]
    }
}

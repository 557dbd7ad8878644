//! GitLab push webhooks
//!
//! GitLab groups nest to arbitrary depth, so any path with at least two
//! segments is accepted. Commit metadata lives in the last entry of
//! `body.commits`.

use argoform_core::resources::Param;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::provider::{CelOverlay, GitProvider, params};

static PATH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.-]+(/[\w.-]+)+$").expect("valid regex"));

const PUSH_EVENT_FILTER: &str = "(header.match('X-Gitlab-Event', 'Push Hook') && body.project.path_with_namespace == '{full_name}') && body.ref.startsWith('refs/heads/')";

#[derive(Debug, Clone, Copy, Default)]
pub struct GitLab;

impl GitProvider for GitLab {
    fn name(&self) -> &'static str {
        "gitlab"
    }

    fn is_valid_path(&self, path: &str) -> bool {
        PATH_RE.is_match(path)
    }

    fn push_binding_params(&self) -> Vec<Param> {
        vec![
            Param::new(params::GIT_REPOSITORY_URL, "$(body.project.git_http_url)"),
            Param::new(params::FULL_NAME, "$(body.project.path_with_namespace)"),
            Param::new(params::GIT_REF, "$(extensions.ref)"),
            Param::new(params::GIT_COMMIT_ID, "$(body.after)"),
            Param::new(params::GIT_COMMIT_DATE, "$(body.commits[-1:].timestamp)"),
            Param::new(params::GIT_COMMIT_MESSAGE, "$(body.commits[-1:].message)"),
            Param::new(params::GIT_COMMIT_AUTHOR, "$(body.commits[-1:].author.name)"),
        ]
    }

    fn push_event_filter(&self, full_name: &str) -> String {
        PUSH_EVENT_FILTER.replace("{full_name}", full_name)
    }

    fn push_overlays(&self) -> Vec<CelOverlay> {
        vec![
            CelOverlay::new("ref", "body.ref.split('/')[2]"),
            CelOverlay::new("short_sha", "body.after.truncate(7)"),
        ]
    }
}

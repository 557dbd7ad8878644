//! Argoform SCM - Git provider abstraction
//!
//! This crate turns repository URLs into [`Repository`] values and produces
//! the Tekton Triggers pieces that react to their push webhooks:
//!
//! - **Parsing**: `host` + `owner/path`, validated against the provider's path shape
//! - **Push bindings**: provider payload fields mapped to one parameter vocabulary
//! - **Push triggers**: secret interceptor followed by a CEL filter with overlays
//!
//! ## Example
//!
//! ```rust
//! use argoform_scm::{DriverIdentifier, Repository};
//!
//! let repo = Repository::new("https://gitlab.com/group/sub/repo.git", &DriverIdentifier::new())?;
//! assert_eq!(repo.path(), "group/sub/repo");
//!
//! let (binding, name) = repo.create_push_binding("cicd");
//! assert_eq!(name, "gitlab-push-binding");
//! # let _ = binding;
//! # Ok::<(), argoform_scm::ScmError>(())
//! ```

pub mod driver;
pub mod error;
pub mod github;
pub mod gitlab;
pub mod provider;
pub mod repository;
pub mod urls;

pub use driver::{DriverIdentifier, Provider, host_from_url};
pub use error::{Result, ScmError};
pub use provider::{CelOverlay, GitProvider, WEBHOOK_SECRET_KEY};
pub use repository::Repository;
pub use urls::{add_git_suffix_if_necessary, repo_name_from_url};

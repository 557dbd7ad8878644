//! Argoform Pipelines - GitOps repository manifest synthesis
//!
//! This crate turns a [`Manifest`] into the complete set of files of a GitOps
//! repository:
//!
//! - **Namespaces**: one per environment plus the CI/CD namespace, with overlays
//! - **ArgoCD**: an Application per environment and application, plus the
//!   `argo-app` / `cicd-app` bootstrap Applications
//! - **Event listeners**: the CI/CD EventListener and per-provider push bindings
//! - **Kustomizations**: a sorted `kustomization.yaml` in every generated directory
//!
//! The synthesis is pure: [`build`] returns a [`ResourceSet`] and never touches
//! the disk or the network. [`output::write_resources`] persists it and
//! [`webhook`] wires git host webhooks through a pluggable client.
//!
//! ## Example
//!
//! ```rust
//! use argoform_core::Manifest;
//!
//! let manifest = Manifest::bootstrap("tst", "https://github.com/org/gitops.git");
//! let files = argoform_pipelines::build(&manifest)?;
//!
//! assert!(files.contains("config/argocd/tst-dev-env-app.yaml"));
//! assert!(files.contains("config/tst-cicd/base/cicd-event-listener.yaml"));
//! # Ok::<(), argoform_pipelines::PipelineError>(())
//! ```

pub mod argocd;
pub mod build;
pub mod error;
pub mod eventlisteners;
pub mod namespaces;
pub mod output;
pub mod webhook;

pub use argoform_core::{Manifest, ResourceSet};
pub use build::{bootstrap_manifest, build, driver_identifier};
pub use error::{PipelineError, Result};
pub use output::{DiskFilesystem, Filesystem, MemoryFilesystem, default_output_dir, write_resources};
pub use webhook::{WebhookClient, WebhookScope, WebhookTarget};

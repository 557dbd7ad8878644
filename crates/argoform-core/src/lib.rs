//! Argoform Core - Core types for GitOps repository scaffolding
//!
//! This crate provides the foundational types used throughout argoform:
//! - `Manifest`: The hierarchical configuration (environments, applications, pipelines)
//! - `paths`: Canonical, forward-slash relative paths for every generated directory
//! - `Visitor` / `walk`: Deterministic traversal of the configuration tree
//! - `ResourceSet`: Path-keyed collection of generated Kubernetes manifests
//! - `resources`: Typed ArgoCD, Tekton Triggers and Kustomize objects

pub mod config;
pub mod error;
pub mod meta;
pub mod paths;
pub mod resources;
pub mod walk;

pub use config::{
    Application, ArgoCdConfig, Config, ConfigRepo, Environment, Manifest, PipelineConfig,
};
pub use error::{CoreError, Result};
pub use resources::{Kustomization, Resource, ResourceSet};
pub use walk::{Aborted, VisitPoint, Visitor, walk};

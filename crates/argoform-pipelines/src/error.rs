//! Error types for argoform-pipelines

use argoform_core::walk::{Aborted, VisitPoint};
use argoform_core::CoreError;
use argoform_scm::ScmError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for manifest synthesis
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or publishing GitOps resources
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum PipelineError {
    /// Configuration model or resource set error
    #[error(transparent)]
    #[diagnostic(code(argoform::core))]
    Core(#[from] CoreError),

    /// Repository parsing error
    #[error(transparent)]
    #[diagnostic(
        code(argoform::scm),
        help("set `privateRepoDriver` to github or gitlab for repositories on a custom host")
    )]
    Scm(#[from] ScmError),

    /// A builder failed mid-traversal
    #[error("build aborted at {location}: {source}")]
    #[diagnostic(code(argoform::walk_aborted))]
    WalkAborted {
        location: VisitPoint,
        source: Box<PipelineError>,
    },

    /// Referenced environment, application or setting is missing
    #[error("{what} not found")]
    #[diagnostic(code(argoform::not_found))]
    NotFound { what: String },

    /// Output file exists and overwriting was not requested
    #[error("output file already exists: {path}")]
    #[diagnostic(
        code(argoform::output_exists),
        help("pass overwrite to replace previously generated files")
    )]
    OutputExists { path: String },

    /// Output path would leave the output directory
    #[error("output path escapes the output directory: {path}")]
    #[diagnostic(code(argoform::invalid_output_path))]
    InvalidOutputPath { path: String },

    /// Git host webhook call failed
    #[error("webhook error for {url}: {message}")]
    #[diagnostic(code(argoform::webhook))]
    Webhook { url: String, message: String },

    /// Deleting webhooks stopped part way
    #[error("deleting webhooks on {url} failed after removing {deleted:?}: {source}")]
    #[diagnostic(
        code(argoform::webhook_delete),
        help("the listed webhooks are gone; retry to remove the rest")
    )]
    WebhookDelete {
        url: String,
        /// Ids removed before the failure
        deleted: Vec<String>,
        source: Box<PipelineError>,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    #[diagnostic(code(argoform::serialization))]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    #[diagnostic(code(argoform::io))]
    Io(#[from] std::io::Error),
}

impl From<serde_yaml::Error> for PipelineError {
    fn from(e: serde_yaml::Error) -> Self {
        PipelineError::Serialization(e.to_string())
    }
}

impl From<Aborted<PipelineError>> for PipelineError {
    fn from(aborted: Aborted<PipelineError>) -> Self {
        PipelineError::WalkAborted {
            location: aborted.at,
            source: Box::new(aborted.error),
        }
    }
}

impl PipelineError {
    /// Whether two builders produced the same output path
    pub fn is_key_collision(&self) -> bool {
        match self {
            PipelineError::Core(CoreError::ResourceKeyCollision { .. }) => true,
            PipelineError::WalkAborted { source, .. } => source.is_key_collision(),
            _ => false,
        }
    }
}

//! Error types for git provider operations

use thiserror::Error;

/// Git provider errors
#[derive(Debug, Error)]
pub enum ScmError {
    #[error("invalid repository URL {url}: {reason}")]
    InvalidRepositoryUrl { url: String, reason: String },

    #[error("invalid repository path for {provider}: {path}")]
    InvalidRepositoryPath { provider: String, path: String },

    #[error("unsupported git provider for host {host}")]
    UnsupportedProvider { host: String },

    #[error("invalid driver type: {driver:?}")]
    UnknownDriver { driver: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for git provider operations
pub type Result<T> = std::result::Result<T, ScmError>;

impl From<serde_json::Error> for ScmError {
    fn from(e: serde_json::Error) -> Self {
        ScmError::Serialization(e.to_string())
    }
}

//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("resource path collision: {path} was generated more than once")]
    ResourceKeyCollision { path: String },

    #[error("duplicate environment name: {name}")]
    DuplicateEnvironment { name: String },

    #[error("duplicate application name '{name}' in environment '{environment}'")]
    DuplicateApplication { environment: String, name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse manifest: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

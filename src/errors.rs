// src/errors.rs

//! Crate-wide error type.
//!
//! Only configuration-class failures travel through this type. Test outcomes
//! are never errors; they are [`crate::engine::EvalResult`] values.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhpGuardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error(
        "Can not find configuration file \"phpguard.yml\" or \"phpguard.yml.dist\" in {0:?}"
    )]
    ConfigNotFound(PathBuf),

    #[error("Linter '{0}' is not registered")]
    UnknownLinter(String),

    #[error("Unknown argument '{0}'")]
    UnknownArgument(String),

    #[error("Invalid pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Coverage report error: {0}")]
    ReportError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PhpGuardError {
    /// True for the fatal, configuration-time category.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PhpGuardError::ConfigError(_)
                | PhpGuardError::ConfigNotFound(_)
                | PhpGuardError::UnknownLinter(_)
                | PhpGuardError::PatternError(_)
                | PhpGuardError::YamlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PhpGuardError>;

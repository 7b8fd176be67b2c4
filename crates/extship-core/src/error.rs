//! Core error types

use thiserror::Error;

use crate::version::VersionError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Project descriptor not found: {path}")]
    ProjectNotFound { path: String },

    #[error("Manifest not found: {path}")]
    ManifestNotFound { path: String },

    #[error("Invalid {file}: {message}")]
    InvalidDescriptor { file: String, message: String },

    #[error("Failed to parse {path}: {source}")]
    JsonParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse extship.yaml: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid version \"{value}\": {reason}")]
    InvalidVersion { value: String, reason: VersionError },

    #[error("Manifest validation failed with {} error(s)", errors.len())]
    ValidationFailed {
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    #[error("Failed to start bundler `{command}`: {source}")]
    BundleSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Bundling failed: `{command}` exited with {status}")]
    BundleFailed { command: String, status: String },

    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Invalid archive pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

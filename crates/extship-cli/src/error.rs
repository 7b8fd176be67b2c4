//! CLI error type
//!
//! Library errors are folded into a few user-facing categories, each with a
//! diagnostic code and, where there is something to do about it, a hint.

use extship_core::CoreError;
use extship_store::StoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Project files missing or unreadable
    #[error("Configuration error: {message}")]
    #[diagnostic(code(extship::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Manifest has validation errors
    #[error("Manifest validation failed: {errors} error(s), {warnings} warning(s)")]
    #[diagnostic(code(extship::cli::validation))]
    Validation {
        errors: usize,
        warnings: usize,
        #[help]
        help: Option<String>,
    },

    /// The bundler could not run or exited non-zero
    #[error("{message}")]
    #[diagnostic(
        code(extship::cli::bundle),
        help("the bundler output above is prefixed with [bundle]")
    )]
    Bundle { message: String },

    /// Writing or cleaning up the release archive failed
    #[error("Packaging failed: {message}")]
    #[diagnostic(code(extship::cli::package))]
    Package { message: String },

    /// No archive for the manifest's current version
    #[error("Archive not found: {path}")]
    #[diagnostic(
        code(extship::cli::archive),
        help("run `extship build` to create it first")
    )]
    ArchiveNotFound { path: String },

    /// Client id or secret missing
    #[error("Missing store credentials: {missing}")]
    #[diagnostic(
        code(extship::cli::credentials),
        help("set them in the environment or in the secret file (default: .env)")
    )]
    Credentials { missing: String },

    /// Token refresh or consent failed
    #[error("Authentication failed: {message}")]
    #[diagnostic(code(extship::cli::auth))]
    Auth {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The store rejected the upload
    #[error("Upload failed: {message}")]
    #[diagnostic(code(extship::cli::upload))]
    Upload { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(extship::cli::io))]
    Io { message: String },

    /// Internal error (runtime, unexpected failure)
    #[error("Internal error: {message}")]
    #[diagnostic(code(extship::cli::internal))]
    Internal { message: String },
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        exit_codes::ERROR
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Validation failure; `strict` notes that warnings counted as errors
    pub fn validation(errors: usize, warnings: usize, strict: bool) -> Self {
        Self::Validation {
            errors,
            warnings,
            help: (strict && warnings > 0)
                .then(|| "--strict treats warnings as errors".to_string()),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProjectNotFound { .. } => CliError::config_with_help(
                err.to_string(),
                "run extship from the project root or pass --root",
            ),
            CoreError::ManifestNotFound { .. } => CliError::config_with_help(
                err.to_string(),
                "set `manifest` in extship.yaml or pass --manifest",
            ),
            CoreError::InvalidDescriptor { .. }
            | CoreError::JsonParse { .. }
            | CoreError::ConfigParse(_)
            | CoreError::InvalidVersion { .. } => CliError::config(err.to_string()),
            CoreError::ValidationFailed { errors, warnings } => {
                CliError::validation(errors.len(), warnings.len(), false)
            }
            CoreError::BundleSpawn { .. } | CoreError::BundleFailed { .. } => CliError::Bundle {
                message: err.to_string(),
            },
            CoreError::Archive { .. } | CoreError::Zip(_) | CoreError::Pattern(_) => {
                CliError::Package {
                    message: err.to_string(),
                }
            }
            CoreError::Io(e) => CliError::from(e),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingCredentials { missing } => CliError::Credentials { missing },
            StoreError::ArchiveNotFound { path } => CliError::ArchiveNotFound { path },
            StoreError::Project(e) => CliError::from(e),
            StoreError::InvalidRefreshToken { .. } => CliError::Auth {
                message: err.to_string(),
                help: Some(
                    "remove REFRESH_TOKEN from the secret file and authorize again".to_string(),
                ),
            },
            StoreError::TokenRequest { .. }
            | StoreError::AuthorizationFailed { .. }
            | StoreError::Callback { .. } => CliError::Auth {
                message: err.to_string(),
                help: None,
            },
            StoreError::UploadFailed { .. } => CliError::Upload {
                message: err.to_string(),
            },
            StoreError::NetworkError { .. } | StoreError::InvalidUrl(_) => CliError::Upload {
                message: err.to_string(),
            },
            StoreError::Io(e) => CliError::from(e),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

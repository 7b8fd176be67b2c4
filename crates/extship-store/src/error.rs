//! Error types for store publishing

use thiserror::Error;

/// Store publishing errors
#[derive(Debug, Error)]
pub enum StoreError {
    // ============ Precondition Errors ============
    #[error("Missing store credentials: {missing}")]
    MissingCredentials { missing: String },

    #[error("Archive not found: {path}")]
    ArchiveNotFound { path: String },

    #[error(transparent)]
    Project(#[from] extship_core::CoreError),

    // ============ Authentication Errors ============
    #[error("Refresh token was rejected: {description}")]
    InvalidRefreshToken { description: String },

    #[error("Token request failed with HTTP {status}: {body}")]
    TokenRequest { status: u16, body: String },

    #[error("Authorization failed: {message}")]
    AuthorizationFailed { message: String },

    #[error("Redirect listener error: {message}")]
    Callback { message: String },

    // ============ Upload Errors ============
    #[error("Upload failed with HTTP {status}: {body}")]
    UploadFailed { status: u16, body: String },

    // ============ Network Errors ============
    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============ IO Errors ============
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            StoreError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else {
            StoreError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

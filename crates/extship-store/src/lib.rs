//! extship Store Publishing
//!
//! This crate provides everything `extship publish` needs:
//!
//! - **Credentials**: OAuth client credentials plus a secret file that
//!   receives newly issued refresh tokens
//! - **Tokens**: refresh-token exchange with a single interactive
//!   re-authorization when the refresh token is rejected
//! - **Callback listener**: a one-shot local HTTP endpoint that receives the
//!   OAuth redirect
//! - **Upload**: pushing the release archive to the store
//!
//! ## Example
//!
//! ```rust,no_run
//! use extship_store::{
//!     BrowserAuthorizer, OAuthClient, PublishRequest, Publisher, RawCredentials, SecretFile,
//!     StoreClient, StoreEndpoints, TokenManager,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = StoreEndpoints::default();
//! let secrets = SecretFile::load(Path::new(".env"))?;
//! let tokens = TokenManager::new(
//!     OAuthClient::new(endpoints.clone())?,
//!     BrowserAuthorizer::default(),
//!     secrets.clone(),
//! );
//! let publisher = Publisher::new(tokens, StoreClient::new(endpoints)?);
//!
//! let credentials = RawCredentials::from_secrets(&secrets);
//! let request = PublishRequest {
//!     manifest: Path::new("manifest.json"),
//!     archive_dir: Path::new("."),
//!     extension_id: Some("abcdefghijklmnopabcdefghijklmnop"),
//! };
//! let outcome = publisher.publish(credentials, &request).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Security Notes
//!
//! - Access tokens are never written to disk and are fetched on every run
//! - Secrets are redacted from `Debug` output

pub mod browser;
pub mod callback;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod oauth;
pub mod publish;
pub mod upload;

// Re-exports for convenience
pub use browser::{BrowserAuthorizer, open_in_browser};
pub use callback::{AuthorizationCallback, CallbackListener, REDIRECT_PORT};
pub use credentials::{OAuthCredentials, Persistence, RawCredentials, SecretFile};
pub use endpoints::StoreEndpoints;
pub use error::{Result, StoreError};
pub use oauth::{AccessToken, Authorizer, OAuthClient, TokenManager, TokenOutcome};
pub use publish::{PublishOutcome, PublishRequest, Publisher, locate_archive};
pub use upload::{StoreClient, UploadResponse};

//! OAuth token handling
//!
//! A publish run always fetches a fresh access token from the refresh token.
//! When there is no refresh token, or the store rejects it with
//! `invalid_grant`, the [`Authorizer`] runs the interactive consent flow once
//! and the new refresh token is persisted through the [`SecretFile`].

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::credentials::{OAuthCredentials, Persistence, REFRESH_TOKEN, SecretFile};
use crate::endpoints::StoreEndpoints;
use crate::error::{Result, StoreError};

/// Short-lived bearer token for the store API
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Token endpoint reply, success or error shaped
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Client for the OAuth endpoints
pub struct OAuthClient {
    http: reqwest::Client,
    endpoints: StoreEndpoints,
}

impl OAuthClient {
    pub fn new(endpoints: StoreEndpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("extship/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, endpoints })
    }

    pub fn endpoints(&self) -> &StoreEndpoints {
        &self.endpoints
    }

    /// Consent page URL requesting offline access to the store scope
    pub fn authorization_url(&self, client_id: &str, redirect_uri: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &self.endpoints.auth_url,
            &[
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("response_type", "code"),
                ("scope", self.endpoints.scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )?;
        Ok(url)
    }

    /// Trade a refresh token for an access token
    ///
    /// An `invalid_grant` reply becomes [`StoreError::InvalidRefreshToken`];
    /// every other failure keeps the raw response body.
    pub async fn refresh_access_token(
        &self,
        credentials: &OAuthCredentials,
        refresh_token: &str,
    ) -> Result<AccessToken> {
        tracing::debug!(url = %self.endpoints.token_url, "refreshing access token");
        let (status, body, parsed) = self
            .token_request(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .await?;

        match parsed {
            Some(TokenResponse {
                access_token: Some(token),
                ..
            }) if (200..300).contains(&status) => Ok(AccessToken::new(token)),
            Some(TokenResponse {
                error: Some(error),
                error_description,
                ..
            }) if error == "invalid_grant" => Err(StoreError::InvalidRefreshToken {
                description: error_description.unwrap_or(error),
            }),
            _ => Err(StoreError::TokenRequest { status, body }),
        }
    }

    /// Trade an authorization code for a refresh token
    pub async fn exchange_code(
        &self,
        credentials: &OAuthCredentials,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String> {
        tracing::debug!(url = %self.endpoints.token_url, "exchanging authorization code");
        let (status, body, parsed) = self
            .token_request(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .await?;

        match parsed {
            Some(TokenResponse {
                refresh_token: Some(token),
                ..
            }) if (200..300).contains(&status) => Ok(token),
            Some(TokenResponse {
                refresh_token: None,
                error: None,
                ..
            }) if (200..300).contains(&status) => Err(StoreError::AuthorizationFailed {
                message: "the token endpoint did not issue a refresh token".to_string(),
            }),
            _ => Err(StoreError::TokenRequest { status, body }),
        }
    }

    async fn token_request(
        &self,
        form: &[(&str, &str)],
    ) -> Result<(u16, String, Option<TokenResponse>)> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let parsed = serde_json::from_str(&body).ok();
        Ok((status, body, parsed))
    }
}

/// Obtains a refresh token through user consent
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, client: &OAuthClient, credentials: &OAuthCredentials)
    -> Result<String>;
}

/// Result of [`TokenManager::access_token`]
#[derive(Debug, Clone)]
pub struct TokenOutcome {
    pub access_token: AccessToken,
    /// Set when a new refresh token was issued during this run
    pub persisted: Option<Persistence>,
}

/// Drives refresh, re-authorization and persistence of tokens
pub struct TokenManager<A: Authorizer> {
    client: OAuthClient,
    authorizer: A,
    secrets: SecretFile,
}

impl<A: Authorizer> TokenManager<A> {
    pub fn new(client: OAuthClient, authorizer: A, secrets: SecretFile) -> Self {
        Self {
            client,
            authorizer,
            secrets,
        }
    }

    /// Fetch an access token, authorizing at most once
    ///
    /// A newly issued refresh token is stored in `credentials` and persisted
    /// before the access token is requested with it.
    pub async fn access_token(&self, credentials: &mut OAuthCredentials) -> Result<TokenOutcome> {
        let mut persisted = None;

        let mut refresh_token = match credentials.refresh_token.clone() {
            Some(token) => token,
            None => {
                tracing::info!("no refresh token available, authorization required");
                let (token, persistence) = self.reauthorize(credentials).await?;
                persisted = Some(persistence);
                token
            }
        };

        loop {
            match self
                .client
                .refresh_access_token(credentials, &refresh_token)
                .await
            {
                Ok(access_token) => {
                    return Ok(TokenOutcome {
                        access_token,
                        persisted,
                    });
                }
                Err(StoreError::InvalidRefreshToken { description }) if persisted.is_none() => {
                    tracing::warn!(%description, "refresh token rejected, authorizing again");
                    let (token, persistence) = self.reauthorize(credentials).await?;
                    persisted = Some(persistence);
                    refresh_token = token;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn reauthorize(
        &self,
        credentials: &mut OAuthCredentials,
    ) -> Result<(String, Persistence)> {
        let token = self.authorizer.authorize(&self.client, credentials).await?;
        credentials.refresh_token = Some(token.clone());
        let persistence = self.secrets.persist(REFRESH_TOKEN, &token)?;
        tracing::debug!(?persistence, "refresh token stored");
        Ok((token, persistence))
    }
}

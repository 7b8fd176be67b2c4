//! Archive upload to the store

use serde::Deserialize;
use std::time::Duration;

use crate::endpoints::StoreEndpoints;
use crate::error::{Result, StoreError};
use crate::oauth::AccessToken;

/// Store API version sent with every upload
const API_VERSION: &str = "2";

/// Upload state reported for an accepted package
pub const UPLOAD_SUCCESS: &str = "SUCCESS";

/// Body of a store upload reply
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub upload_state: Option<String>,
    #[serde(default)]
    pub item_error: Vec<serde_json::Value>,
}

impl UploadResponse {
    pub fn is_success(&self) -> bool {
        self.upload_state.as_deref() == Some(UPLOAD_SUCCESS)
    }
}

/// Client for the store's item upload endpoint
pub struct StoreClient {
    http: reqwest::Client,
    endpoints: StoreEndpoints,
}

impl StoreClient {
    pub fn new(endpoints: StoreEndpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("extship/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self { http, endpoints })
    }

    /// Replace the extension's package with `archive`
    ///
    /// Only a 2xx reply whose `uploadState` is `SUCCESS` counts; anything else
    /// fails with the raw body.
    pub async fn upload(
        &self,
        extension_id: &str,
        token: &AccessToken,
        archive: Vec<u8>,
    ) -> Result<UploadResponse> {
        let url = self.endpoints.item_upload_url(extension_id);
        tracing::debug!(%url, bytes = archive.len(), "uploading archive");

        let response = self
            .http
            .put(&url)
            .bearer_auth(token.secret())
            .header("x-goog-api-version", API_VERSION)
            .body(archive)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<UploadResponse>(&body) {
            Ok(parsed) if status.is_success() && parsed.is_success() => Ok(parsed),
            _ => Err(StoreError::UploadFailed {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

//! Store and OAuth endpoint locations

/// OAuth scope granting access to the store's item management API
pub const STORE_SCOPE: &str = "https://www.googleapis.com/auth/chromewebstore";

/// Where the OAuth and upload requests go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEndpoints {
    /// Interactive consent page
    pub auth_url: String,
    /// Code exchange and refresh endpoint
    pub token_url: String,
    /// Upload endpoint; the extension id is appended as a path segment
    pub upload_url: String,
    pub scope: String,
}

impl Default for StoreEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            upload_url: "https://www.googleapis.com/upload/chromewebstore/v1.1/items".to_string(),
            scope: STORE_SCOPE.to_string(),
        }
    }
}

impl StoreEndpoints {
    /// Point every endpoint at a single base URL, keeping the real paths
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/auth", base),
            token_url: format!("{}/token", base),
            upload_url: format!("{}/upload/chromewebstore/v1.1/items", base),
            scope: STORE_SCOPE.to_string(),
        }
    }

    /// Upload URL for one extension
    pub fn item_upload_url(&self, extension_id: &str) -> String {
        format!("{}/{}", self.upload_url.trim_end_matches('/'), extension_id)
    }
}

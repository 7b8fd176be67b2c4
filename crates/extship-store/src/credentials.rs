//! OAuth client credentials and the secret file
//!
//! Credentials are an explicit value passed down the publish flow. When a new
//! refresh token is issued it is written into that value and appended to the
//! secret file in one place; nothing reads it back from the process
//! environment afterwards.

use indexmap::IndexMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

pub const CLIENT_ID: &str = "CLIENT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
pub const REFRESH_TOKEN: &str = "REFRESH_TOKEN";
pub const EXTENSION_ID: &str = "EXTENSION_ID";

/// Credentials as found, before the required ones are checked
#[derive(Clone, Default)]
pub struct RawCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl RawCredentials {
    /// Take every value from a secret file
    pub fn from_secrets(secrets: &SecretFile) -> Self {
        Self {
            client_id: secrets.get(CLIENT_ID).map(String::from),
            client_secret: secrets.get(CLIENT_SECRET).map(String::from),
            refresh_token: secrets.get(REFRESH_TOKEN).map(String::from),
        }
    }

    /// Fill values that are still missing from a secret file
    #[must_use]
    pub fn or_secrets(self, secrets: &SecretFile) -> Self {
        let fallback = Self::from_secrets(secrets);
        Self {
            client_id: non_empty(self.client_id).or(fallback.client_id),
            client_secret: non_empty(self.client_secret).or(fallback.client_secret),
            refresh_token: non_empty(self.refresh_token).or(fallback.refresh_token),
        }
    }

    /// Check that the client id and secret are present
    pub fn resolve(self) -> Result<OAuthCredentials> {
        let client_id = non_empty(self.client_id);
        let client_secret = non_empty(self.client_secret);

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(OAuthCredentials {
                client_id,
                client_secret,
                refresh_token: non_empty(self.refresh_token),
            }),
            (id, secret) => {
                let missing: Vec<&str> = [
                    (id.is_none(), CLIENT_ID),
                    (secret.is_none(), CLIENT_SECRET),
                ]
                .into_iter()
                .filter_map(|(absent, name)| absent.then_some(name))
                .collect();
                Err(StoreError::MissingCredentials {
                    missing: missing.join(", "),
                })
            }
        }
    }
}

impl fmt::Debug for RawCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// OAuth client credentials for the store API
#[derive(Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: None,
        }
    }

    #[must_use]
    pub fn with_refresh_token(mut self, token: impl Into<String>) -> Self {
        self.refresh_token = Some(token.into());
        self
    }
}

impl fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where a newly issued refresh token ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persistence {
    /// Appended to the secret file
    Appended(PathBuf),
    /// No secret file exists; the token has to be copied by hand
    Manual { token: String },
}

/// A `KEY=VALUE` secret file, such as `.env`
#[derive(Debug, Clone, Default)]
pub struct SecretFile {
    path: PathBuf,
    entries: IndexMap<String, String>,
}

impl SecretFile {
    /// Read a secret file; a missing file yields an empty set
    pub fn load(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            parse_entries(&std::fs::read_to_string(path)?)
        } else {
            IndexMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-empty value for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Persist a value by appending it, if the file exists
    pub fn persist(&self, key: &str, value: &str) -> Result<Persistence> {
        if !self.path.exists() {
            return Ok(Persistence::Manual {
                token: value.to_string(),
            });
        }

        let existing = std::fs::read_to_string(&self.path)?;
        let mut line = String::new();
        if !existing.is_empty() && !existing.ends_with('\n') {
            line.push('\n');
        }
        line.push_str(&format!("{}={}\n", key, value));

        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;

        Ok(Persistence::Appended(self.path.clone()))
    }
}

/// Parse `KEY=VALUE` lines; later keys override earlier ones
fn parse_entries(content: &str) -> IndexMap<String, String> {
    let mut entries = IndexMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        entries.insert(key.trim().to_string(), unquote(value.trim()).to_string());
    }

    entries
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

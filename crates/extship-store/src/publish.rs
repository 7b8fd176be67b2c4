//! The publish flow
//!
//! Preconditions are checked in order, each failing on its own: client
//! credentials, the manifest, then the archive for the manifest's current
//! name and version. Without an extension id the flow ends there and the
//! archive is reported as ready for a manual upload.

use std::path::{Path, PathBuf};

use extship_core::Manifest;

use crate::credentials::{Persistence, RawCredentials};
use crate::error::{Result, StoreError};
use crate::oauth::{Authorizer, TokenManager};
use crate::upload::{StoreClient, UploadResponse};

/// Find the archive built for the manifest's current slug and version
pub fn locate_archive(manifest: &Manifest, archive_dir: &Path) -> Result<PathBuf> {
    let path = archive_dir.join(manifest.archive_name()?);
    if path.is_file() {
        Ok(path)
    } else {
        Err(StoreError::ArchiveNotFound {
            path: path.display().to_string(),
        })
    }
}

/// Inputs of a publish run
#[derive(Debug, Clone, Copy)]
pub struct PublishRequest<'a> {
    pub manifest: &'a Path,
    /// Directory the build writes archives to
    pub archive_dir: &'a Path,
    pub extension_id: Option<&'a str>,
}

/// How a publish run ended
#[derive(Debug, Clone)]
pub enum PublishOutcome {
    /// The store accepted the archive
    Uploaded {
        archive: PathBuf,
        response: UploadResponse,
        /// Where a refresh token issued during the run was stored
        persisted: Option<Persistence>,
    },
    /// No extension id is configured; upload the archive by hand
    ReadyForManualUpload { archive: PathBuf },
}

impl PublishOutcome {
    pub fn archive(&self) -> &Path {
        match self {
            PublishOutcome::Uploaded { archive, .. } => archive,
            PublishOutcome::ReadyForManualUpload { archive } => archive,
        }
    }
}

/// Uploads built archives to the store
pub struct Publisher<A: Authorizer> {
    tokens: TokenManager<A>,
    store: StoreClient,
}

impl<A: Authorizer> Publisher<A> {
    pub fn new(tokens: TokenManager<A>, store: StoreClient) -> Self {
        Self { tokens, store }
    }

    pub async fn publish(
        &self,
        credentials: RawCredentials,
        request: &PublishRequest<'_>,
    ) -> Result<PublishOutcome> {
        let mut credentials = credentials.resolve()?;
        let manifest = Manifest::load(request.manifest)?;
        let archive = locate_archive(&manifest, request.archive_dir)?;
        tracing::debug!(archive = %archive.display(), "archive located");

        let Some(extension_id) = request.extension_id.filter(|id| !id.trim().is_empty()) else {
            tracing::info!("no extension id configured, skipping upload");
            return Ok(PublishOutcome::ReadyForManualUpload { archive });
        };

        let token = self.tokens.access_token(&mut credentials).await?;
        let bytes = tokio::fs::read(&archive).await?;
        let response = self
            .store
            .upload(extension_id, &token.access_token, bytes)
            .await?;

        Ok(PublishOutcome::Uploaded {
            archive,
            response,
            persisted: token.persisted,
        })
    }
}

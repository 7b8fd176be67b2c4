//! Publish command - upload the built archive to the store

use console::style;
use extship_store::credentials::EXTENSION_ID;
use extship_store::{
    BrowserAuthorizer, OAuthClient, Persistence, PublishOutcome, PublishRequest, Publisher,
    RawCredentials, SecretFile, StoreClient, StoreEndpoints, TokenManager,
};
use std::path::Path;

use crate::error::Result;
use crate::util::display_path;

/// Secrets given on the command line or through the environment
#[derive(Debug, Default)]
pub struct PublishArgs {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
    pub extension_id: Option<String>,
}

pub async fn run(root: &Path, manifest: Option<&Path>, args: PublishArgs) -> Result<()> {
    let (_, layout) = super::load_layout(root, manifest, None)?;
    let secrets = SecretFile::load(&layout.secrets_file)?;

    let credentials = RawCredentials {
        client_id: args.client_id,
        client_secret: args.client_secret,
        refresh_token: args.refresh_token,
    }
    .or_secrets(&secrets);
    let extension_id = args
        .extension_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| secrets.get(EXTENSION_ID).map(str::to_string));

    let endpoints = StoreEndpoints::default();
    let tokens = TokenManager::new(
        OAuthClient::new(endpoints.clone())?,
        BrowserAuthorizer::default(),
        secrets.clone(),
    );
    let publisher = Publisher::new(tokens, StoreClient::new(endpoints)?);

    println!("{} Publishing {}", style("→").blue(), layout.root.display());

    let request = PublishRequest {
        manifest: &layout.manifest,
        archive_dir: &layout.root,
        extension_id: extension_id.as_deref(),
    };
    let outcome = publisher.publish(credentials, &request).await?;
    let archive = display_path(&layout.root, outcome.archive());

    match &outcome {
        PublishOutcome::Uploaded {
            response,
            persisted,
            ..
        } => {
            if let Some(persisted) = persisted {
                print_persistence(&layout.root, &secrets, persisted);
            }
            println!(
                "  {} Uploaded {} ({})",
                style("✓").green(),
                archive,
                response.upload_state.as_deref().unwrap_or_default()
            );
            println!();
            println!("{} Published!", style("✓").green().bold());
        }
        PublishOutcome::ReadyForManualUpload { .. } => {
            println!("  {} Found {}", style("✓").green(), archive);
            println!(
                "  {} No {} configured, upload the archive in the developer dashboard",
                style("⚠").yellow(),
                EXTENSION_ID
            );
            println!();
            println!("{} Ready for manual upload", style("✓").green().bold());
        }
    }

    Ok(())
}

fn print_persistence(root: &Path, secrets: &SecretFile, persisted: &Persistence) {
    match persisted {
        Persistence::Appended(path) => println!(
            "  {} Refresh token saved to {}",
            style("✓").green(),
            display_path(root, path)
        ),
        Persistence::Manual { token } => {
            println!(
                "  {} {} does not exist, add this line to keep the authorization:",
                style("⚠").yellow(),
                display_path(root, secrets.path())
            );
            println!("    REFRESH_TOKEN={}", token);
        }
    }
}

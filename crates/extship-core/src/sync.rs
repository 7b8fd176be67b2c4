//! Version synchronization between the project descriptor and the manifest
//!
//! Whichever file carries the higher version wins and the other one is
//! rewritten, so a bump in either place reaches both.

use crate::descriptor::{Manifest, ProjectDescriptor};
use crate::error::Result;
use crate::version::ExtensionVersion;

/// Result of reconciling the two versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The version both files now carry
    pub highest: ExtensionVersion,
    pub project_updated: bool,
    pub manifest_updated: bool,
}

impl SyncOutcome {
    pub fn changed(&self) -> bool {
        self.project_updated || self.manifest_updated
    }
}

/// Bring both descriptors up to the higher of their two versions
///
/// Only files whose version is lower are written.
pub fn synchronize_versions(
    project: &mut ProjectDescriptor,
    manifest: &mut Manifest,
) -> Result<SyncOutcome> {
    let project_version = project.version()?;
    let manifest_version = manifest.version()?;
    let highest = std::cmp::max(project_version.clone(), manifest_version.clone());

    let project_updated = project_version < highest;
    if project_updated {
        tracing::debug!(from = %project_version, to = %highest, "bumping project version");
        project.set_version(&highest);
        project.save()?;
    }

    let manifest_updated = manifest_version < highest;
    if manifest_updated {
        tracing::debug!(from = %manifest_version, to = %highest, "bumping manifest version");
        manifest.set_version(&highest);
        manifest.save()?;
    }

    Ok(SyncOutcome {
        highest,
        project_updated,
        manifest_updated,
    })
}

//! The build pipeline
//!
//! Stages run strictly in order and the first failure ends the run:
//!
//! ```text
//! LoadConfigs -> Validate -> SynchronizeVersions -> EnsureOutputDir
//!     -> InvokeBundler -> Package -> Done
//! ```
//!
//! Validation errors abort before anything is bumped or bundled. Validation
//! warnings only keep the `Package` stage from writing an archive.

use std::fmt;

use crate::archive::{PackageOutcome, Packager};
use crate::bundle::{BundleOutput, Bundler, run_bundler};
use crate::config::ProjectLayout;
use crate::descriptor::{Manifest, ProjectDescriptor};
use crate::error::{CoreError, Result};
use crate::sync::{SyncOutcome, synchronize_versions};
use crate::validate::{ValidationResult, validate_and_fill};

/// Pipeline stage, used for logging progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStage {
    LoadConfigs,
    Validate,
    SynchronizeVersions,
    EnsureOutputDir,
    InvokeBundler,
    Package,
    Done,
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildStage::LoadConfigs => "load-configs",
            BuildStage::Validate => "validate",
            BuildStage::SynchronizeVersions => "synchronize-versions",
            BuildStage::EnsureOutputDir => "ensure-output-dir",
            BuildStage::InvokeBundler => "invoke-bundler",
            BuildStage::Package => "package",
            BuildStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Knobs for a single build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Shell command that runs the bundler
    pub bundle_command: String,
    /// Produce an archive when the skip conditions allow it
    pub package: bool,
}

/// Everything a successful build did
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub validation: ValidationResult,
    pub sync: SyncOutcome,
    pub bundle: BundleOutput,
    pub package: PackageOutcome,
}

/// Runs the build stages against a project layout
pub struct BuildPipeline<'a, B: Bundler> {
    layout: &'a ProjectLayout,
    bundler: B,
    options: BuildOptions,
}

impl<'a, B: Bundler> BuildPipeline<'a, B> {
    pub fn new(layout: &'a ProjectLayout, bundler: B, options: BuildOptions) -> Self {
        Self {
            layout,
            bundler,
            options,
        }
    }

    fn enter(&self, stage: BuildStage) {
        tracing::debug!(%stage, "build stage");
    }

    /// Run every stage to completion
    pub async fn run(&self) -> Result<BuildReport> {
        self.enter(BuildStage::LoadConfigs);
        let mut project = ProjectDescriptor::load(&self.layout.package)?;
        let mut manifest = Manifest::load(&self.layout.manifest)?;

        self.enter(BuildStage::Validate);
        let validation = validate_and_fill(&mut manifest, &project)?;
        if !validation.is_valid() {
            return Err(CoreError::ValidationFailed {
                errors: validation.errors,
                warnings: validation.warnings,
            });
        }

        self.enter(BuildStage::SynchronizeVersions);
        let sync = synchronize_versions(&mut project, &mut manifest)?;

        self.enter(BuildStage::EnsureOutputDir);
        std::fs::create_dir_all(&self.layout.out_dir)?;

        self.enter(BuildStage::InvokeBundler);
        let bundle = run_bundler(&self.bundler, &self.options.bundle_command)?;

        self.enter(BuildStage::Package);
        let package = if self.options.package {
            let packager = Packager::new(
                &self.layout.root,
                &self.layout.out_dir,
                &self.layout.ignore_file,
            );
            packager
                .package(&manifest.slug()?, &sync.highest, validation.warnings.len())
                .await?
        } else {
            PackageOutcome::Disabled
        };

        self.enter(BuildStage::Done);
        Ok(BuildReport {
            validation,
            sync,
            bundle,
            package,
        })
    }
}

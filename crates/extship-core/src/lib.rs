//! extship Core - build-side building blocks for browser extension releases
//!
//! This crate provides everything `extship build` needs:
//! - `Manifest` / `ProjectDescriptor`: the two JSON descriptors of a project
//! - `ExtensionVersion`: the 1-4 part version scheme used by extension stores
//! - `validate`: required and recommended manifest field checks
//! - `sync`: reconciling the project and manifest versions
//! - `bundle`: invoking the external bundler
//! - `archive`: versioned zip packaging and stale archive cleanup
//! - `build`: the pipeline tying it all together

pub mod archive;
pub mod build;
pub mod bundle;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod ignore;
pub mod sync;
pub mod validate;
pub mod version;

pub use archive::{
    ArchiveEntry, PackageOutcome, Packager, archive_file_name, archive_glob, create_archive,
    list_archive, remove_stale_archives, slugify,
};
pub use build::{BuildOptions, BuildPipeline, BuildReport, BuildStage};
pub use bundle::{BundleOutput, Bundler, ShellBundler, run_bundler};
pub use config::{CONFIG_FILE, ProjectConfig, ProjectLayout};
pub use descriptor::{Manifest, ProjectDescriptor};
pub use error::{CoreError, Result};
pub use ignore::ensure_ignored;
pub use sync::{SyncOutcome, synchronize_versions};
pub use validate::{ValidationResult, validate_and_fill, validate_manifest};
pub use version::{ExtensionVersion, VersionError, compare_versions};

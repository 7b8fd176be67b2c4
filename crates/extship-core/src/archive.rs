//! Release archive creation for extship
//!
//! A release archive is a `.zip` of the build output directory, flattened so
//! the extension files sit at the root of the archive, named after the
//! manifest: `{slug}-v{major-minor-patch}.zip`.
//!
//! Cleanup policy: once a new archive is written, every other
//! `{slug}-v*.zip` in the project root is deleted, including files that were
//! placed there by hand.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{CoreError, Result};
use crate::ignore::ensure_ignored;
use crate::version::ExtensionVersion;

/// Deflate level used for release archives
pub const COMPRESSION_LEVEL: i64 = 9;

/// Turn a manifest name into the slug used in archive names
///
/// Lowercases and collapses every run of whitespace into one hyphen;
/// leading and trailing whitespace is dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Archive file name for a slug and version
#[must_use]
pub fn archive_file_name(slug: &str, version: &ExtensionVersion) -> String {
    format!("{}-v{}.zip", slug, version.dashed())
}

/// Wildcard matching every archive of a slug
#[must_use]
pub fn archive_glob(slug: &str) -> String {
    format!("{}-v*.zip", slug)
}

/// Zip a directory into `output`
///
/// Compression runs on the blocking pool; the future resolves once the
/// archive is finished and flushed to disk. The archive is written to a
/// sibling `.partial` file and only renamed to `output` once complete, so a
/// failed run never leaves a file at `output`.
pub async fn create_archive(source_dir: &Path, output: &Path) -> Result<PathBuf> {
    let source = source_dir.to_path_buf();
    let target = output.to_path_buf();

    tokio::task::spawn_blocking(move || write_archive(&source, &target))
        .await
        .map_err(|e| CoreError::Archive {
            message: format!("archive writer stopped: {}", e),
        })??;

    Ok(output.to_path_buf())
}

/// Scratch path an archive is written to before it is moved into place
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    output.with_file_name(name)
}

fn write_archive(source_dir: &Path, output: &Path) -> Result<()> {
    let partial = partial_path(output);

    let written = write_zip(source_dir, &partial).and_then(|()| {
        std::fs::rename(&partial, output)?;
        Ok(())
    });
    if written.is_err() && partial.exists() {
        if let Err(e) = std::fs::remove_file(&partial) {
            tracing::warn!(path = %partial.display(), "failed to remove partial archive: {}", e);
        }
    }

    written
}

fn write_zip(source_dir: &Path, output: &Path) -> Result<()> {
    if !source_dir.is_dir() {
        return Err(CoreError::Archive {
            message: format!("output directory not found: {}", source_dir.display()),
        });
    }

    let file = File::create(output)?;
    let mut writer = ZipWriter::new(BufWriter::new(file));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| CoreError::Archive {
            message: e.to_string(),
        })?;
        let name = archive_path(source_dir, entry.path())?;

        if entry.file_type().is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
        } else {
            writer.start_file(name, options)?;
            let mut content = File::open(entry.path())?;
            std::io::copy(&mut content, &mut writer)?;
        }
    }

    let buffered = writer.finish()?;
    let file = buffered.into_inner().map_err(|e| CoreError::Io(e.into_error()))?;
    file.sync_all()?;

    Ok(())
}

/// Path of a file inside the archive, always `/`-separated
fn archive_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|e| CoreError::Archive {
        message: format!("{}: {}", path.display(), e),
    })?;

    Ok(relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// Information about a file in an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Relative path within the archive
    pub path: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// List files in an archive
pub fn list_archive(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        entries.push(ArchiveEntry {
            path: entry.name().to_string(),
            size: entry.size(),
            is_dir: entry.is_dir(),
        });
    }

    Ok(entries)
}

/// Delete every archive of `slug` in `dir` except `keep`
///
/// Returns the removed paths.
pub fn remove_stale_archives(dir: &Path, slug: &str, keep: &Path) -> Result<Vec<PathBuf>> {
    let pattern = Pattern::new(&archive_glob(&Pattern::escape(slug)))?;
    let keep_name = keep.file_name();

    let mut removed = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name_str) = name.to_str() else {
            continue;
        };
        if !pattern.matches(name_str) || Some(name.as_os_str()) == keep_name {
            continue;
        }
        if !entry.file_type()?.is_file() {
            continue;
        }

        std::fs::remove_file(entry.path())?;
        tracing::debug!(archive = %entry.path().display(), "removed stale archive");
        removed.push(entry.path());
    }

    removed.sort();
    Ok(removed)
}

/// What the packaging step did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageOutcome {
    /// A new archive was written
    Created {
        path: PathBuf,
        /// Older archives of the same slug that were deleted
        removed: Vec<PathBuf>,
        /// Whether the ignore-list gained the archive pattern
        ignore_updated: bool,
    },
    /// An archive for this version already exists and was left untouched
    AlreadyExists { path: PathBuf },
    /// Validation warnings are outstanding
    WarningsPresent { count: usize },
    /// Packaging was turned off for this run
    Disabled,
}

impl PackageOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, PackageOutcome::Created { .. })
    }
}

/// Packs the build output next to the project descriptor
#[derive(Debug, Clone)]
pub struct Packager {
    /// Directory archives are written to
    pub root: PathBuf,
    /// Directory that gets zipped
    pub out_dir: PathBuf,
    /// Ignore-list that receives the archive pattern
    pub ignore_file: PathBuf,
}

impl Packager {
    pub fn new(
        root: impl Into<PathBuf>,
        out_dir: impl Into<PathBuf>,
        ignore_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            root: root.into(),
            out_dir: out_dir.into(),
            ignore_file: ignore_file.into(),
        }
    }

    /// Where the archive for a slug and version lives
    pub fn archive_path(&self, slug: &str, version: &ExtensionVersion) -> PathBuf {
        self.root.join(archive_file_name(slug, version))
    }

    /// Package the output directory unless a skip condition holds
    pub async fn package(
        &self,
        slug: &str,
        version: &ExtensionVersion,
        warnings: usize,
    ) -> Result<PackageOutcome> {
        let path = self.archive_path(slug, version);

        if path.exists() {
            tracing::debug!(archive = %path.display(), "archive already exists, skipping");
            return Ok(PackageOutcome::AlreadyExists { path });
        }
        if warnings > 0 {
            tracing::debug!(warnings, "validation warnings outstanding, skipping packaging");
            return Ok(PackageOutcome::WarningsPresent { count: warnings });
        }

        create_archive(&self.out_dir, &path).await?;
        let removed = remove_stale_archives(&self.root, slug, &path)?;
        let ignore_updated = ensure_ignored(&self.ignore_file, &archive_glob(slug))?;

        Ok(PackageOutcome::Created {
            path,
            removed,
            ignore_updated,
        })
    }
}

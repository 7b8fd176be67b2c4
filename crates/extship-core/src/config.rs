//! Project configuration
//!
//! Optional `extship.yaml` at the project root. Every key has a default, so
//! a project without the file behaves like a stock extension template.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Name of the configuration file looked up in the project root
pub const CONFIG_FILE: &str = "extship.yaml";

/// Configuration file contents
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Extension manifest, relative to the root
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// Project descriptor, relative to the root
    #[serde(default = "default_package")]
    pub package: PathBuf,

    /// Directory the bundler writes to and the packager zips
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// Shell command that runs the bundler
    #[serde(default = "default_bundle_command")]
    pub bundle_command: String,

    /// Ignore-list that receives the archive pattern
    #[serde(default = "default_ignore_file")]
    pub ignore_file: PathBuf,

    /// Secret file holding store credentials
    #[serde(default = "default_secrets_file")]
    pub secrets_file: PathBuf,
}

fn default_manifest() -> PathBuf {
    PathBuf::from("manifest.json")
}

fn default_package() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_bundle_command() -> String {
    "npx vite build".to_string()
}

fn default_ignore_file() -> PathBuf {
    PathBuf::from(".gitignore")
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from(".env")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            package: default_package(),
            out_dir: default_out_dir(),
            bundle_command: default_bundle_command(),
            ignore_file: default_ignore_file(),
            secrets_file: default_secrets_file(),
        }
    }
}

impl ProjectConfig {
    /// Load `extship.yaml` from a project root, or defaults if absent
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // An empty file deserializes to null rather than an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Resolve every path against the project root
    pub fn layout(&self, root: &Path) -> ProjectLayout {
        ProjectLayout {
            root: root.to_path_buf(),
            manifest: root.join(&self.manifest),
            package: root.join(&self.package),
            out_dir: root.join(&self.out_dir),
            ignore_file: root.join(&self.ignore_file),
            secrets_file: root.join(&self.secrets_file),
        }
    }
}

/// Absolute locations of everything a build or publish touches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Project root; archives are written here
    pub root: PathBuf,
    pub manifest: PathBuf,
    pub package: PathBuf,
    pub out_dir: PathBuf,
    pub ignore_file: PathBuf,
    pub secrets_file: PathBuf,
}

impl ProjectLayout {
    /// Layout of a project using the default configuration
    pub fn with_defaults(root: &Path) -> Self {
        ProjectConfig::default().layout(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_when_missing() {
        let temp = TempDir::new().unwrap();
        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config, ProjectConfig::default());
        assert_eq!(config.bundle_command, "npx vite build");
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            "outDir: build\nbundleCommand: npm run build\n",
        )
        .unwrap();

        let config = ProjectConfig::load(temp.path()).unwrap();
        assert_eq!(config.out_dir, PathBuf::from("build"));
        assert_eq!(config.bundle_command, "npm run build");
        assert_eq!(config.manifest, PathBuf::from("manifest.json"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE);
        std::fs::write(&path, "\n").unwrap();

        assert_eq!(ProjectConfig::load_from(&path).unwrap(), ProjectConfig::default());
    }

    #[test]
    fn test_layout_resolves_against_root() {
        let layout = ProjectLayout::with_defaults(Path::new("/work/ext"));
        assert_eq!(layout.manifest, PathBuf::from("/work/ext/manifest.json"));
        assert_eq!(layout.out_dir, PathBuf::from("/work/ext/dist"));
        assert_eq!(layout.ignore_file, PathBuf::from("/work/ext/.gitignore"));
    }
}

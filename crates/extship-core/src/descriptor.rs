//! Project and manifest descriptor files
//!
//! Both files are JSON objects that are read, partially checked and written
//! back in place. Unknown keys are kept in their original order, and writes
//! always use 2-space pretty printing with a trailing newline.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::archive::{archive_file_name, slugify};
use crate::error::{CoreError, Result};
use crate::version::ExtensionVersion;

/// The extension manifest (`manifest.json`)
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    fields: Map<String, Value>,
}

impl Manifest {
    /// Load a manifest from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(CoreError::ManifestNotFound {
                path: path.display().to_string(),
            });
        }
        let fields = read_object(&path)?;
        Ok(Self { path, fields })
    }

    /// Build an in-memory manifest that will be saved to `path`
    pub fn from_fields(path: impl Into<PathBuf>, fields: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }

    /// Write the manifest back to where it was loaded from
    pub fn save(&self) -> Result<()> {
        write_object(&self.path, &self.fields)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The `name` field, if it is a string
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// Parse the `version` field
    pub fn version(&self) -> Result<ExtensionVersion> {
        parse_version_field(&self.fields, "manifest")
    }

    pub fn set_version(&mut self, version: &ExtensionVersion) {
        self.fields
            .insert("version".to_string(), Value::String(version.to_string()));
    }

    /// Archive slug derived from the manifest name
    pub fn slug(&self) -> Result<String> {
        let name = self.name().ok_or_else(|| CoreError::InvalidDescriptor {
            file: "manifest".to_string(),
            message: "name must be a string".to_string(),
        })?;
        Ok(slugify(name))
    }

    /// Archive file name for the current name and version
    pub fn archive_name(&self) -> Result<String> {
        let slug = self.slug()?;
        let version = self.version()?;
        Ok(archive_file_name(&slug, &version))
    }
}

/// The project descriptor (`package.json`)
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    path: PathBuf,
    fields: Map<String, Value>,
}

impl ProjectDescriptor {
    /// Load a project descriptor from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(CoreError::ProjectNotFound {
                path: path.display().to_string(),
            });
        }
        let fields = read_object(&path)?;
        Ok(Self { path, fields })
    }

    pub fn from_fields(path: impl Into<PathBuf>, fields: Map<String, Value>) -> Self {
        Self {
            path: path.into(),
            fields,
        }
    }

    pub fn save(&self) -> Result<()> {
        write_object(&self.path, &self.fields)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The `name` field, if it is a non-empty string
    pub fn name(&self) -> Option<&str> {
        self.fields
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
    }

    pub fn version(&self) -> Result<ExtensionVersion> {
        parse_version_field(&self.fields, "project descriptor")
    }

    pub fn set_version(&mut self, version: &ExtensionVersion) {
        self.fields
            .insert("version".to_string(), Value::String(version.to_string()));
    }
}

fn parse_version_field(fields: &Map<String, Value>, file: &str) -> Result<ExtensionVersion> {
    let raw = match fields.get("version") {
        Some(Value::String(s)) => s,
        Some(_) => {
            return Err(CoreError::InvalidDescriptor {
                file: file.to_string(),
                message: "version must be a string".to_string(),
            });
        }
        None => {
            return Err(CoreError::InvalidDescriptor {
                file: file.to_string(),
                message: "missing version".to_string(),
            });
        }
    };

    ExtensionVersion::parse(raw).map_err(|reason| CoreError::InvalidVersion {
        value: raw.clone(),
        reason,
    })
}

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content).map_err(|source| CoreError::JsonParse {
        path: path.display().to_string(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        _ => Err(CoreError::InvalidDescriptor {
            file: path.display().to_string(),
            message: "expected a JSON object".to_string(),
        }),
    }
}

fn write_object(path: &Path, fields: &Map<String, Value>) -> Result<()> {
    let mut content =
        serde_json::to_string_pretty(fields).map_err(|source| CoreError::JsonParse {
            path: path.display().to_string(),
            source,
        })?;
    content.push('\n');
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_manifest() {
        let temp = TempDir::new().unwrap();
        let err = Manifest::load(temp.path().join("manifest.json")).unwrap_err();
        assert!(matches!(err, CoreError::ManifestNotFound { .. }));

        let err = ProjectDescriptor::load(temp.path().join("package.json")).unwrap_err();
        assert!(matches!(err, CoreError::ProjectNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_save_preserves_key_order_and_indent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"name":"My Ext","version":"1.0","permissions":["storage"],"action":{"default_popup":"popup.html"}}"#,
        )
        .unwrap();

        let mut manifest = Manifest::load(&path).unwrap();
        manifest.set_version(&ExtensionVersion::parse("1.1").unwrap());
        manifest.save().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        insta::assert_snapshot!(written.trim_end(), @r#"
        {
          "name": "My Ext",
          "version": "1.1",
          "permissions": [
            "storage"
          ],
          "action": {
            "default_popup": "popup.html"
          }
        }
        "#);
    }

    #[test]
    fn test_archive_name() {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String("My Ext".into()));
        fields.insert("version".into(), Value::String("1.0.1".into()));
        let manifest = Manifest::from_fields("manifest.json", fields);

        assert_eq!(manifest.slug().unwrap(), "my-ext");
        assert_eq!(manifest.archive_name().unwrap(), "my-ext-v1-0-1.zip");
    }

    #[test]
    fn test_invalid_version_field() {
        let mut fields = Map::new();
        fields.insert("version".into(), Value::from(3));
        let project = ProjectDescriptor::from_fields("package.json", fields);
        assert!(matches!(
            project.version().unwrap_err(),
            CoreError::InvalidDescriptor { .. }
        ));
    }

    #[test]
    fn test_project_name_ignores_empty() {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(String::new()));
        let project = ProjectDescriptor::from_fields("package.json", fields);
        assert!(project.name().is_none());
    }
}

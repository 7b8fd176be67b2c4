//! Manifest validation
//!
//! Two classes of findings are collected, never fail-fast:
//! - errors: fields the browser requires; any error aborts a build
//! - warnings: fields the store listing expects; warnings only block packaging
//!
//! `manifest_version` and `name` are filled in when they are missing and a
//! sensible value is known.

use serde::Serialize;
use serde_json::Value;

use crate::descriptor::{Manifest, ProjectDescriptor};
use crate::error::Result;
use crate::version::ExtensionVersion;

/// The only manifest format accepted
pub const REQUIRED_MANIFEST_VERSION: u64 = 3;

/// Longest extension name accepted by the browser
pub const MAX_NAME_LEN: usize = 75;

/// Longest description shown by the store
pub const MAX_DESCRIPTION_LEN: usize = 132;

/// Icon formats the store accepts
pub const ICON_EXTENSIONS: &[&str] = &["png", "bmp", "gif", "ico", "jpg", "jpeg"];

/// Icon size the store requires for its listing
pub const STORE_ICON_SIZE: &str = "128";

/// Findings from a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Fields that were missing and have been filled in
    pub filled: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether the manifest was changed and needs saving
    pub fn is_dirty(&self) -> bool {
        !self.filled.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validate a manifest, filling missing fields in memory only
pub fn validate_manifest(manifest: &mut Manifest, project: &ProjectDescriptor) -> ValidationResult {
    let mut result = ValidationResult::default();

    check_manifest_version(manifest, &mut result);
    check_name(manifest, project, &mut result);
    check_version(manifest, &mut result);
    check_description(manifest, &mut result);
    check_icons(manifest, &mut result);

    result
}

/// Validate a manifest and save it if any field was filled in
pub fn validate_and_fill(
    manifest: &mut Manifest,
    project: &ProjectDescriptor,
) -> Result<ValidationResult> {
    let result = validate_manifest(manifest, project);
    if result.is_dirty() {
        tracing::debug!(fields = ?result.filled, "saving manifest with filled fields");
        manifest.save()?;
    }
    Ok(result)
}

fn check_manifest_version(manifest: &mut Manifest, result: &mut ValidationResult) {
    match manifest.get("manifest_version") {
        None => {
            manifest.fields_mut().insert(
                "manifest_version".to_string(),
                Value::from(REQUIRED_MANIFEST_VERSION),
            );
            result.filled.push("manifest_version".to_string());
        }
        Some(value) if value.as_u64() == Some(REQUIRED_MANIFEST_VERSION) => {}
        Some(value) => result.error(format!(
            "manifest_version must be {} (found {})",
            REQUIRED_MANIFEST_VERSION, value
        )),
    }
}

fn check_name(manifest: &mut Manifest, project: &ProjectDescriptor, result: &mut ValidationResult) {
    match manifest.get("name") {
        None => match project.name() {
            Some(name) => {
                manifest
                    .fields_mut()
                    .insert("name".to_string(), Value::String(name.to_string()));
                result.filled.push("name".to_string());
            }
            None => result.error("missing name"),
        },
        Some(Value::String(name)) => {
            let len = name.chars().count();
            if len > MAX_NAME_LEN {
                result.error(format!(
                    "name is longer than {} characters (found {})",
                    MAX_NAME_LEN, len
                ));
            }
        }
        Some(_) => result.error("name must be a string"),
    }
}

fn check_version(manifest: &Manifest, result: &mut ValidationResult) {
    match manifest.get("version") {
        None => result.error("missing version"),
        Some(Value::String(raw)) => {
            if let Err(reason) = ExtensionVersion::parse(raw) {
                result.error(format!("version \"{}\" {}", raw, reason));
            }
        }
        Some(_) => result.error("version must be a string"),
    }
}

fn check_description(manifest: &Manifest, result: &mut ValidationResult) {
    match manifest.get("description") {
        None => result.warning("missing description (shown on the store listing)"),
        Some(Value::String(description)) => {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LEN {
                result.warning(format!(
                    "description is longer than {} characters (found {})",
                    MAX_DESCRIPTION_LEN, len
                ));
            }
        }
        Some(_) => result.warning("description must be a string"),
    }
}

fn check_icons(manifest: &Manifest, result: &mut ValidationResult) {
    let icons = match manifest.get("icons") {
        None => {
            result.warning("missing icons (the store requires a 128px icon)");
            return;
        }
        Some(Value::Object(icons)) => icons,
        Some(_) => {
            result.warning("icons must be an object mapping sizes to image paths");
            return;
        }
    };

    if !icons.contains_key(STORE_ICON_SIZE) {
        result.warning(format!(
            "icons has no \"{}\" entry (the store requires a 128px icon)",
            STORE_ICON_SIZE
        ));
    }

    for (size, path) in icons {
        match path.as_str() {
            Some(path) if has_icon_extension(path) => {}
            Some(path) => result.warning(format!(
                "icon \"{}\" ({}) must be one of: {}",
                size,
                path,
                ICON_EXTENSIONS.join(", ")
            )),
            None => result.warning(format!("icon \"{}\" must be an image path", size)),
        }
    }
}

fn has_icon_extension(path: &str) -> bool {
    path.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ICON_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};
    use tempfile::TempDir;

    fn manifest(value: Value) -> Manifest {
        let Value::Object(fields) = value else {
            panic!("test manifest must be an object");
        };
        Manifest::from_fields("manifest.json", fields)
    }

    fn project(name: &str) -> ProjectDescriptor {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(name.into()));
        fields.insert("version".into(), Value::String("1.0.0".into()));
        ProjectDescriptor::from_fields("package.json", fields)
    }

    fn complete() -> Value {
        json!({
            "manifest_version": 3,
            "name": "My Ext",
            "version": "1.0.0",
            "description": "Destroys the page",
            "icons": { "16": "icon16.png", "128": "icon128.png" }
        })
    }

    #[test]
    fn test_complete_manifest_is_clean() {
        let mut m = manifest(complete());
        let result = validate_manifest(&mut m, &project("my-ext"));
        assert_eq!(result, ValidationResult::default());
    }

    #[test]
    fn test_required_fields_produce_no_errors() {
        let mut m = manifest(json!({
            "manifest_version": 3,
            "name": "x".repeat(MAX_NAME_LEN),
            "version": "0.0.1",
        }));
        let result = validate_manifest(&mut m, &project("my-ext"));
        assert!(result.is_valid(), "{:?}", result.errors);
        // Store fields are missing, which is advisory only
        assert_eq!(result.warnings.len(), 2);
    }

    #[test]
    fn test_manifest_version_is_filled() {
        let mut m = manifest(json!({ "name": "My Ext", "version": "1.0" }));
        let result = validate_manifest(&mut m, &project("my-ext"));

        assert!(result.is_valid());
        assert_eq!(result.filled, vec!["manifest_version"]);
        assert_eq!(m.get("manifest_version"), Some(&json!(3)));
    }

    #[test]
    fn test_wrong_manifest_version() {
        let mut m = manifest(json!({ "manifest_version": 2, "name": "A", "version": "1" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors, vec!["manifest_version must be 3 (found 2)"]);

        let mut m = manifest(json!({ "manifest_version": "3", "name": "A", "version": "1" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_name_filled_from_project() {
        let mut m = manifest(json!({ "manifest_version": 3, "version": "1.0" }));
        let result = validate_manifest(&mut m, &project("chrome-template"));

        assert!(result.is_valid());
        assert_eq!(result.filled, vec!["name"]);
        assert_eq!(m.name(), Some("chrome-template"));
    }

    #[test]
    fn test_name_missing_everywhere() {
        let mut m = manifest(json!({ "manifest_version": 3, "version": "1.0" }));
        let result = validate_manifest(&mut m, &project(""));
        assert_eq!(result.errors, vec!["missing name"]);
        assert!(result.filled.is_empty());
    }

    #[test]
    fn test_name_rules() {
        let mut m = manifest(json!({ "manifest_version": 3, "name": 42, "version": "1" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors, vec!["name must be a string"]);

        let mut m = manifest(json!({
            "manifest_version": 3,
            "name": "x".repeat(MAX_NAME_LEN + 1),
            "version": "1",
        }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors, vec!["name is longer than 75 characters (found 76)"]);
    }

    #[test]
    fn test_version_reports_one_error() {
        let mut m = manifest(json!({ "manifest_version": 3, "name": "A", "version": "0.0.0.0.0" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(
            result.errors,
            vec!["version \"0.0.0.0.0\" must have 1 to 4 dot-separated parts (found 5)"]
        );

        let mut m = manifest(json!({ "manifest_version": 3, "name": "A" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors, vec!["missing version"]);
    }

    #[test]
    fn test_errors_are_collected() {
        let mut m = manifest(json!({ "manifest_version": 2, "name": [], "version": "01" }));
        let result = validate_manifest(&mut m, &project("a"));
        assert_eq!(result.errors.len(), 3);
    }

    #[test]
    fn test_description_length_boundary() {
        let mut at_limit = complete();
        at_limit["description"] = json!("d".repeat(MAX_DESCRIPTION_LEN));
        let result = validate_manifest(&mut manifest(at_limit), &project("a"));
        assert!(!result.warnings.iter().any(|w| w.contains("description")));

        let mut over = complete();
        over["description"] = json!("d".repeat(MAX_DESCRIPTION_LEN + 1));
        let result = validate_manifest(&mut manifest(over), &project("a"));
        let description_warnings: Vec<_> = result
            .warnings
            .iter()
            .filter(|w| w.contains("description"))
            .collect();
        assert_eq!(description_warnings.len(), 1);
    }

    #[test]
    fn test_icon_warnings() {
        let mut value = complete();
        value["icons"] = json!({ "16": "icon.svg", "48": 48, "128": "ICON.PNG" });
        let result = validate_manifest(&mut manifest(value), &project("a"));
        insta::assert_snapshot!(result.warnings.join("\n"), @r#"
        icon "16" (icon.svg) must be one of: png, bmp, gif, ico, jpg, jpeg
        icon "48" must be an image path
        "#);
    }

    #[test]
    fn test_icons_missing_store_size() {
        let mut value = complete();
        value["icons"] = json!({ "48": "icon48.png" });
        let result = validate_manifest(&mut manifest(value), &project("a"));
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("\"128\""));

        let mut value = complete();
        value["icons"] = json!(["icon.png"]);
        let result = validate_manifest(&mut manifest(value), &project("a"));
        assert_eq!(
            result.warnings,
            vec!["icons must be an object mapping sizes to image paths"]
        );
    }

    #[test]
    fn test_validate_and_fill_persists() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        std::fs::write(&path, r#"{"version": "1.0"}"#).unwrap();

        let mut m = Manifest::load(&path).unwrap();
        let result = validate_and_fill(&mut m, &project("from-package")).unwrap();
        assert!(result.is_dirty());

        let reloaded = Manifest::load(&path).unwrap();
        assert_eq!(reloaded.name(), Some("from-package"));
        assert_eq!(reloaded.get("manifest_version"), Some(&json!(3)));
    }

    #[test]
    fn test_validate_and_fill_leaves_clean_file_alone() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("manifest.json");
        let original = r#"{"manifest_version":3,"name":"A","version":"1"}"#;
        std::fs::write(&path, original).unwrap();

        let mut m = Manifest::load(&path).unwrap();
        validate_and_fill(&mut m, &project("a")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}

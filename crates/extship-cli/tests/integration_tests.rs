//! Integration tests for CLI commands

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SECRET_VARS: &[&str] = &["CLIENT_ID", "CLIENT_SECRET", "REFRESH_TOKEN", "EXTENSION_ID"];

const STORE_READY: &str = r#"{
  "manifest_version": 3,
  "name": "My Ext",
  "version": "1.0.0",
  "description": "Destroys the current page",
  "icons": {
    "128": "icon128.png"
  }
}
"#;

/// Helper to run extship against a project root with a clean environment
fn extship(root: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_extship"));
    command.arg("--root").arg(root).args(args).env_remove("RUST_LOG");
    for var in SECRET_VARS {
        command.env_remove(var);
    }
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("Failed to execute extship")
}

fn project(manifest: &str, package_version: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("manifest.json"), manifest).unwrap();
    std::fs::write(
        temp.path().join("package.json"),
        format!(
            "{{\n  \"name\": \"my-ext\",\n  \"version\": \"{}\"\n}}\n",
            package_version
        ),
    )
    .unwrap();
    temp
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[cfg(unix)]
mod build_command {
    use super::*;

    const BUNDLE: &str = "mkdir -p dist && echo 'console.log(1)' > dist/background.js";

    #[test]
    fn test_build_bumps_version_and_packages() {
        let temp = project(STORE_READY, "1.0.1");

        let output = extship(temp.path(), &["build", "--bundle-command", BUNDLE], &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(temp.path().join("my-ext-v1-0-1.zip").exists());
        assert!(stdout(&output).contains("background.js"));

        let manifest: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(temp.path().join("manifest.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(manifest["version"], "1.0.1");

        let ignore = std::fs::read_to_string(temp.path().join(".gitignore")).unwrap();
        assert!(ignore.contains("my-ext-v*.zip"));
    }

    #[test]
    fn test_second_build_skips_existing_archive() {
        let temp = project(STORE_READY, "1.0.0");

        let first = extship(temp.path(), &["build", "--bundle-command", BUNDLE], &[]);
        assert!(first.status.success());

        let second = extship(temp.path(), &["build", "--bundle-command", BUNDLE], &[]);
        assert!(second.status.success());
        assert!(stdout(&second).contains("already exists"));
    }

    #[test]
    fn test_warnings_skip_packaging() {
        let temp = project(
            r#"{"manifest_version": 3, "name": "My Ext", "version": "1.0.0"}"#,
            "1.0.0",
        );

        let output = extship(temp.path(), &["build", "--bundle-command", BUNDLE], &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(temp.path().join("dist").join("background.js").exists());
        assert!(stdout(&output).contains("Packaging skipped"));
        assert!(!temp.path().join("my-ext-v1-0-0.zip").exists());

        // Warnings are reported once, on stdout
        let stdout = stdout(&output);
        assert_eq!(stdout.matches("missing description").count(), 1);
        assert!(!stderr(&output).contains("missing description"));
    }

    #[test]
    fn test_validation_errors_fail_before_bundling() {
        let temp = project(
            r#"{"manifest_version": 2, "name": "My Ext", "version": "1.0.0"}"#,
            "1.0.0",
        );

        let output = extship(temp.path(), &["build", "--bundle-command", BUNDLE], &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("manifest_version must be 3 (found 2)"));
        assert!(stderr(&output).contains("FATAL"));
        assert!(!temp.path().join("dist").exists());
    }

    #[test]
    fn test_bundler_failure_exits_with_error() {
        let temp = project(STORE_READY, "1.0.0");

        let output = extship(
            temp.path(),
            &["build", "--bundle-command", "echo broken >&2; exit 3"],
            &[],
        );

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("[bundle] broken"));
        assert!(stderr.contains("exited with status 3"));
    }

    #[test]
    fn test_no_package_flag() {
        let temp = project(STORE_READY, "1.0.0");

        let output = extship(
            temp.path(),
            &["build", "--bundle-command", BUNDLE, "--no-package"],
            &[],
        );

        assert!(output.status.success());
        assert!(!temp.path().join("my-ext-v1-0-0.zip").exists());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_json_output() {
        let temp = project(r#"{"name": "My Ext", "version": "1.0.0"}"#, "1.0.0");

        let output = extship(temp.path(), &["validate", "--json"], &[]);

        assert!(output.status.success());
        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["valid"], true);
        assert_eq!(json["errors"].as_array().unwrap().len(), 0);
        assert_eq!(json["warnings"].as_array().unwrap().len(), 2);
        assert_eq!(json["filled"][0], "manifest_version");

        // The filled field is persisted
        let manifest = std::fs::read_to_string(temp.path().join("manifest.json")).unwrap();
        assert!(manifest.contains("\"manifest_version\": 3"));
    }

    #[test]
    fn test_validate_strict_fails_on_warnings() {
        let temp = project(
            r#"{"manifest_version": 3, "name": "My Ext", "version": "1.0.0"}"#,
            "1.0.0",
        );

        let output = extship(temp.path(), &["validate", "--json", "--strict"], &[]);

        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        assert_eq!(json["valid"], false);
    }

    #[test]
    fn test_validate_reports_errors() {
        let temp = project(
            r#"{"manifest_version": 3, "name": "My Ext", "version": "1.0.0.0.0"}"#,
            "1.0.0",
        );

        let output = extship(temp.path(), &["validate"], &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stdout(&output).contains("must have 1 to 4 dot-separated parts"));
    }

    #[test]
    fn test_missing_manifest() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name": "x", "version": "1.0.0"}"#)
            .unwrap();

        let output = extship(temp.path(), &["validate"], &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Manifest not found"));
    }
}

mod publish_command {
    use super::*;

    const CREDENTIALS: &[(&str, &str)] = &[("CLIENT_ID", "id.apps"), ("CLIENT_SECRET", "secret")];

    #[test]
    fn test_missing_credentials() {
        let temp = project(STORE_READY, "1.0.0");

        let output = extship(temp.path(), &["publish"], &[]);

        assert_eq!(output.status.code(), Some(1));
        assert!(stderr(&output).contains("Missing store credentials: CLIENT_ID, CLIENT_SECRET"));
    }

    #[test]
    fn test_missing_archive() {
        let temp = project(STORE_READY, "1.0.0");

        let output = extship(temp.path(), &["publish"], CREDENTIALS);

        assert_eq!(output.status.code(), Some(1));
        let stderr = stderr(&output);
        assert!(stderr.contains("Archive not found"));
        assert!(stderr.contains("my-ext-v1-0-0.zip"));
        assert!(stderr.contains("extship build"));
    }

    #[test]
    fn test_ready_for_manual_upload_without_extension_id() {
        let temp = project(STORE_READY, "1.0.0");
        std::fs::write(temp.path().join("my-ext-v1-0-0.zip"), b"PK").unwrap();

        let output = extship(temp.path(), &["publish"], CREDENTIALS);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
        assert!(stdout(&output).contains("Ready for manual upload"));
    }

    #[test]
    fn test_credentials_from_secret_file() {
        let temp = project(STORE_READY, "1.0.0");
        std::fs::write(
            temp.path().join(".env"),
            "CLIENT_ID=id.apps\nCLIENT_SECRET=secret\n",
        )
        .unwrap();
        std::fs::write(temp.path().join("my-ext-v1-0-0.zip"), b"PK").unwrap();

        let output = extship(temp.path(), &["publish"], &[]);

        assert!(output.status.success(), "stderr: {}", stderr(&output));
    }
}

//! Bundler invocation
//!
//! The bundler is an opaque external command. It runs once, synchronously,
//! and its captured output is forwarded to the log with a `[bundle]` prefix
//! whether it succeeds or not.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{CoreError, Result};

/// Captured result of a bundler run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code, `None` when the process was killed by a signal
    pub status: Option<i32>,
}

impl BundleOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// All captured lines, stdout first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().chain(self.stderr.lines())
    }
}

/// Runs a bundler command
pub trait Bundler {
    fn invoke(&self, command: &str) -> std::io::Result<BundleOutput>;
}

/// Runs the command through the platform shell in a working directory
#[derive(Debug, Clone)]
pub struct ShellBundler {
    workdir: PathBuf,
}

impl ShellBundler {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl Bundler for ShellBundler {
    fn invoke(&self, command: &str) -> std::io::Result<BundleOutput> {
        let output = shell(command).current_dir(&self.workdir).output()?;
        Ok(BundleOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status.code(),
        })
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", command]);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.args(["-c", command]);
    cmd
}

/// Run the bundler and forward its output; a non-zero exit is fatal
pub fn run_bundler(bundler: &dyn Bundler, command: &str) -> Result<BundleOutput> {
    tracing::debug!(command, "invoking bundler");

    let output = bundler
        .invoke(command)
        .map_err(|source| CoreError::BundleSpawn {
            command: command.to_string(),
            source,
        })?;

    for line in output.lines() {
        tracing::info!(target: "extship::bundle", "[bundle] {}", line);
    }

    if !output.success() {
        let status = output
            .status
            .map(|code| format!("status {}", code))
            .unwrap_or_else(|| "a signal".to_string());
        return Err(CoreError::BundleFailed {
            command: command.to_string(),
            status,
        });
    }

    Ok(output)
}

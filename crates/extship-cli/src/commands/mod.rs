//! CLI commands

pub mod build;
pub mod publish;
pub mod validate;

use extship_core::{ProjectConfig, ProjectLayout};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Load `extship.yaml` under `root` and apply command-line overrides
pub fn load_layout(
    root: &Path,
    manifest: Option<&Path>,
    out_dir: Option<&Path>,
) -> Result<(ProjectConfig, ProjectLayout)> {
    let config = ProjectConfig::load(root)?;
    let mut layout = config.layout(root);

    if let Some(manifest) = manifest {
        layout.manifest = resolve(root, manifest);
    }
    if let Some(out_dir) = out_dir {
        layout.out_dir = resolve(root, out_dir);
    }

    tracing::debug!(?layout, "project layout");
    Ok((config, layout))
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

//! Validate command - check the manifest without building

use console::style;
use extship_core::{Manifest, ProjectDescriptor, validate_and_fill};
use std::path::Path;

use crate::display::ValidationReport;
use crate::error::{CliError, Result};
use crate::util::display_path;

pub fn run(root: &Path, manifest: Option<&Path>, json_output: bool, strict: bool) -> Result<()> {
    let (_, layout) = super::load_layout(root, manifest, None)?;

    let project = ProjectDescriptor::load(&layout.package)?;
    let mut manifest = Manifest::load(&layout.manifest)?;
    let manifest_name = display_path(&layout.root, &layout.manifest);

    if !json_output {
        println!("{} Validating {}", style("→").blue(), manifest_name);
    }

    let result = validate_and_fill(&mut manifest, &project)?;
    let valid = result.is_valid() && !(strict && result.has_warnings());

    if json_output {
        let output = serde_json::json!({
            "valid": valid,
            "errors": result.errors,
            "warnings": result.warnings,
            "filled": result.filled,
        });
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", rendered);
    } else {
        let report = ValidationReport::from_result(&manifest_name, &result);
        report.display();
        println!();
        report.print_summary();
    }

    if valid {
        Ok(())
    } else {
        Err(CliError::validation(
            result.errors.len(),
            result.warnings.len(),
            strict,
        ))
    }
}

//! Build command - validate, sync versions, bundle and package

use console::style;
use extship_core::{
    BuildOptions, BuildPipeline, BuildReport, BundleOutput, Bundler, CoreError, PackageOutcome,
    ShellBundler, SyncOutcome, list_archive,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::display::ValidationReport;
use crate::error::{CliError, Result};
use crate::util::{display_path, format_size};

/// Shows a spinner while the wrapped bundler runs
struct SpinnerBundler {
    inner: ShellBundler,
}

impl Bundler for SpinnerBundler {
    fn invoke(&self, command: &str) -> std::io::Result<BundleOutput> {
        let spinner = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::with_template("  {spinner:.cyan} {msg}") {
            spinner.set_style(template);
        }
        spinner.set_message(format!("Bundling with `{}`", command));
        spinner.enable_steady_tick(Duration::from_millis(100));

        let output = self.inner.invoke(command);
        spinner.finish_and_clear();
        output
    }
}

pub struct BuildArgs<'a> {
    pub manifest: Option<&'a Path>,
    pub out_dir: Option<&'a Path>,
    pub bundle_command: Option<&'a str>,
    pub no_package: bool,
}

pub async fn run(root: &Path, args: BuildArgs<'_>) -> Result<()> {
    let (config, layout) = super::load_layout(root, args.manifest, args.out_dir)?;
    let options = BuildOptions {
        bundle_command: args
            .bundle_command
            .map(str::to_string)
            .unwrap_or(config.bundle_command),
        package: !args.no_package,
    };

    println!(
        "{} Building extension in {}",
        style("→").blue(),
        layout.root.display()
    );

    let bundler = SpinnerBundler {
        inner: ShellBundler::new(&layout.root),
    };
    let manifest_name = display_path(&layout.root, &layout.manifest);

    let report = match BuildPipeline::new(&layout, bundler, options.clone()).run().await {
        Ok(report) => report,
        Err(CoreError::ValidationFailed { errors, warnings }) => {
            let mut validation = ValidationReport::new(&manifest_name);
            errors.iter().for_each(|e| validation.add_error(e));
            warnings.iter().for_each(|w| validation.add_warning(w));
            validation.display();
            println!();
            validation.print_summary();
            return Err(CliError::validation(errors.len(), warnings.len(), false));
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&layout.root, &manifest_name, &options, &report)?;
    Ok(())
}

fn print_report(
    root: &Path,
    manifest_name: &str,
    options: &BuildOptions,
    report: &BuildReport,
) -> Result<()> {
    let validation = ValidationReport::from_result(manifest_name, &report.validation);
    validation.display();

    println!();
    print_sync(&report.sync);
    println!(
        "  {} Bundled with `{}`",
        style("✓").green(),
        options.bundle_command
    );

    match &report.package {
        PackageOutcome::Created {
            path,
            removed,
            ignore_updated,
        } => {
            let size = std::fs::metadata(path)?.len();
            println!(
                "  {} {} {}",
                style("Created").green().bold(),
                display_path(root, path),
                style(format_size(size)).dim()
            );
            for old in removed {
                println!(
                    "  {} {}",
                    style("Removed").yellow(),
                    display_path(root, old)
                );
            }
            if *ignore_updated {
                println!("  {} Archive pattern added to the ignore file", style("+").green());
            }

            println!();
            println!("{}:", style("Contents").bold());
            for entry in list_archive(path)? {
                if !entry.is_dir {
                    println!("  {} {}", entry.path, style(format_size(entry.size)).dim());
                }
            }
        }
        PackageOutcome::AlreadyExists { path } => {
            println!(
                "  {} Packaging skipped: {} already exists",
                style("⚠").yellow(),
                display_path(root, path)
            );
        }
        PackageOutcome::WarningsPresent { count } => {
            println!(
                "  {} Packaging skipped: {} validation warning(s) to fix first",
                style("⚠").yellow(),
                count
            );
        }
        PackageOutcome::Disabled => {
            println!("  {} Packaging disabled", style("-").dim());
        }
    }

    println!();
    println!(
        "{} Build of v{} complete!",
        style("✓").green().bold(),
        report.sync.highest
    );
    Ok(())
}

fn print_sync(sync: &SyncOutcome) {
    let updated: Vec<&str> = [
        (sync.project_updated, "project descriptor"),
        (sync.manifest_updated, "manifest"),
    ]
    .into_iter()
    .filter_map(|(changed, name)| changed.then_some(name))
    .collect();

    if updated.is_empty() {
        println!("  {} Version {} in sync", style("✓").green(), sync.highest);
    } else {
        println!(
            "  {} Version {} written to {}",
            style("✓").green(),
            sync.highest,
            updated.join(" and ")
        );
    }
}

//! extship CLI - build, package and publish browser extensions

use clap::{Parser, Subcommand};
use console::style;
use miette::Diagnostic;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod display;
mod error;
mod exit_codes;
mod logging;
mod util;

use commands::build::BuildArgs;
use commands::publish::PublishArgs;
use error::{CliError, Result};
use logging::{LogArgs, fatal};

#[derive(Parser)]
#[command(name = "extship")]
#[command(version)]
#[command(about = "Build, package and publish browser extensions", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    log: LogArgs,

    /// Project root containing the manifest and project descriptor
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Manifest path, overriding extship.yaml
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the manifest, sync versions, bundle and package
    Build {
        /// Bundler output directory, overriding extship.yaml
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Bundler command, overriding extship.yaml
        #[arg(long)]
        bundle_command: Option<String>,

        /// Never write a release archive
        #[arg(long)]
        no_package: bool,
    },

    /// Check the manifest and fill in missing fields
    Validate {
        /// Output validation results as JSON
        #[arg(long)]
        json: bool,

        /// Strict mode - treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Upload the archive for the current version to the store
    Publish {
        /// OAuth client id
        #[arg(long, env = "CLIENT_ID", hide_env_values = true)]
        client_id: Option<String>,

        /// OAuth client secret
        #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,

        /// OAuth refresh token; obtained interactively when absent
        #[arg(long, env = "REFRESH_TOKEN", hide_env_values = true)]
        refresh_token: Option<String>,

        /// Store item id; without it the archive is only located
        #[arg(long, env = "EXTENSION_ID")]
        extension_id: Option<String>,
    },
}

async fn run(cli: Cli) -> Result<()> {
    let root = cli.root.as_path();
    let manifest = cli.manifest.as_deref();

    match cli.command {
        Commands::Build {
            out_dir,
            bundle_command,
            no_package,
        } => {
            commands::build::run(
                root,
                BuildArgs {
                    manifest,
                    out_dir: out_dir.as_deref(),
                    bundle_command: bundle_command.as_deref(),
                    no_package,
                },
            )
            .await
        }

        Commands::Validate { json, strict } => {
            commands::validate::run(root, manifest, json, strict)
        }

        Commands::Publish {
            client_id,
            client_secret,
            refresh_token,
            extension_id,
        } => {
            commands::publish::run(
                root,
                manifest,
                PublishArgs {
                    client_id,
                    client_secret,
                    refresh_token,
                    extension_id,
                },
            )
            .await
        }
    }
}

fn main() -> ExitCode {
    miette::set_panic_hook();

    let cli = Cli::parse();
    logging::init_global_subscriber(cli.log);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            fatal!(CliError::internal(e.to_string()));
            return ExitCode::from(exit_codes::ERROR);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(e) => {
            fatal!(e);
            if let Some(help) = e.help() {
                eprintln!("  {} {}", style("help:").cyan(), help);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

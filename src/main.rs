//! nuup - applies a resolved NuGet package update
//!
//! Reads an update request (JSON) naming a package, its target version and
//! every file that declares it, then rewrites each declaration:
//! - packages.config (after restoring packages)
//! - legacy and SDK-style project files
//! - .nuspec manifests
//! - Directory.Build.props / Directory.Packages.props

use anyhow::Context;
use clap::Parser;
use nuup::cli::CliArgs;
use nuup::domain::UpdateRequest;
use nuup::observer::{Observers, TracingObserver};
use nuup::orchestrator::Orchestrator;
use nuup::output::{create_formatter, OutputConfig};
use nuup::progress::ProgressObserver;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    // Run the main logic and handle errors
    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    args.validate()?;
    let config = args.runner_config()?;

    if args.verbose {
        eprintln!("nuup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Request: {}", args.request.display());
        if config.dry_run {
            eprintln!("Mode: dry-run");
        }
    }

    let request = UpdateRequest::from_file(&args.request)
        .with_context(|| format!("loading {}", args.request.display()))?;

    let observers = Observers::new()
        .with(TracingObserver)
        .with(ProgressObserver::new(args.show_progress()));
    let orchestrator = Orchestrator::standard(config.clone())?.with_observer(observers);

    // Ctrl-C stops scheduling; in-flight steps finish
    let token = orchestrator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling remaining references");
            token.cancel();
        }
    });

    let result = orchestrator.run(&request).await?;

    // Output results
    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet, config.dry_run)
        .with_color(!args.no_color);
    let formatter = create_formatter(output_config);
    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    if result.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Some references failed or were cancelled
        Ok(ExitCode::from(2))
    }
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use batch_file_egress::cli::Args;
use batch_file_egress::cloud::{create_http_client, SasBlobClient};
use batch_file_egress::config::{resolve_working_directory, UploadManifest, UploaderConfig};
use batch_file_egress::constants::FAILURE_EXIT_CODE;
use batch_file_egress::errors::classify;
use batch_file_egress::security::scrub_credentials;
use batch_file_egress::uploader::FileUploader;

fn main() {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = initialize_logging(args.verbose) {
        println!("{:?}", e);
    }

    if let Err(e) = run(&args) {
        report_failure(&e);
        std::process::exit(FAILURE_EXIT_CODE);
    }
}

/// Initialize logging with the specified verbosity level.
///
/// Log lines go to stdout; stderr is reserved for the JSON error document.
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("batch_file_egress")
        .build();
    TermLogger::init(log_level, config, TerminalMode::Stdout, ColorChoice::Auto)
        .context("Failed to initialize logger")?;
    Ok(())
}

/// Load the manifest and upload everything it selects for this task outcome
fn run(args: &Args) -> Result<()> {
    let source = args.manifest_source();
    info!("Loading output file manifest from {}", source);
    let manifest = UploadManifest::load(&source)?;

    let working_directory = resolve_working_directory(args.working_dir.as_deref())?;
    let config = UploaderConfig::new(working_directory)
        .with_concurrency(args.concurrency)
        .with_max_retries(args.max_retries)
        .with_request_timeout(Duration::from_secs(args.timeout));
    config.validate()?;

    info!(
        "Processing {} output file rule(s) for task outcome {} in {}",
        manifest.output_files.len(),
        args.task_outcome(),
        config.working_directory.display()
    );

    let client = create_http_client(config.request_timeout)?;
    let store = Arc::new(SasBlobClient::new(client, config.max_retries));
    let uploader = FileUploader::new(store, config);

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
    runtime.block_on(uploader.run(&manifest, args.task_outcome()))?;

    Ok(())
}

/// Print the diagnostic trace to stdout and the classified error to stderr
fn report_failure(error: &anyhow::Error) {
    println!("{}", scrub_credentials(&format!("{:?}", error)));

    let specification = classify(error);
    match serde_json::to_string(&specification) {
        Ok(json) => eprintln!("{}", json),
        Err(e) => println!("Failed to serialize error specification: {}", e),
    }
}

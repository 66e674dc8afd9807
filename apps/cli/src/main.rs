//! docupload entry point.

mod cli;
mod config;
mod render;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use docupload_client::{HttpBackend, IngestionBackend, TransportSelector, UploadError, UploadSpec};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::CliConfig;
use render::Output;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = CliConfig::load(cli.config.as_deref())?;
    config.apply_overrides(cli.server, cli.chunk_size, cli.direct_limit);
    tracing::debug!(server = %config.server_url, "configuration resolved");

    match cli.command {
        Commands::Upload { file, name, json } => {
            let output = if json { Output::Json } else { Output::Text };
            upload(&config, &file, name.as_deref(), output).await
        }
        Commands::Plan { file } => {
            plan(&config, &file)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn upload(
    config: &CliConfig,
    file: &Path,
    name: Option<&str>,
    output: Output,
) -> anyhow::Result<ExitCode> {
    let backend: Arc<dyn IngestionBackend> = Arc::new(HttpBackend::new(config.server_url.clone())?);
    let selector = TransportSelector::new(backend, config.upload.clone())?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Cancelling after the current request...");
            on_interrupt.cancel();
        }
    });

    let result = match UploadSpec::from_path(file, name).await {
        Ok(spec) => {
            selector
                .select_and_upload(&spec, &output.reporter(), &cancel)
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(receipt) => {
            output.receipt(&receipt)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "upload error");
            eprintln!("Error: {}", e.user_message());
            Ok(match e {
                UploadError::Cancelled => ExitCode::from(130),
                _ => ExitCode::FAILURE,
            })
        }
    }
}

fn plan(config: &CliConfig, file: &Path) -> anyhow::Result<()> {
    config.upload.validate()?;
    let total_size = std::fs::metadata(file)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", file.display()))?
        .len();
    let chunk_plan = docupload_transfer::plan(total_size, config.upload.chunk_size).ok();
    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!(
        "{}",
        render::plan_summary(&file_name, total_size, &config.upload, chunk_plan)
    );
    Ok(())
}

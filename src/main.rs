//! Imagecast - one `generate_image` tool call across image generation APIs.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod input;
mod mime;
mod model;
mod output;
mod params;
mod ports;
mod providers;
mod redact;
mod tool;

use std::path::Path;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::{RecordingSession, ServiceContext};
use crate::error::ImageError;
use crate::tool::{generate_image, ToolResponse};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let response = match run(&cli).await {
        Ok(response) => response,
        Err(e) => e.into(),
    };

    match serde_json::to_string_pretty(&response) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: failed to render result: {e}"),
    }
    if response.is_error() {
        process::exit(1);
    }
}

/// Logs go to stderr; stdout carries only the tool result.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,imagecast=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

async fn run(cli: &Cli) -> Result<ToolResponse, ImageError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?.with_env(std::env::vars());
    tracing::debug!(path = %config_path.display(), providers = ?config.aliases(), "loaded config");

    let args = cli.tool_arguments().map_err(ImageError::InvalidInput)?;
    let cwd = std::env::current_dir()?;

    // Create context based on mode (live / recording / replaying)
    let replay_path = std::env::var("IMAGECAST_REPLAY").ok().filter(|p| !p.is_empty());
    let is_recording = std::env::var("IMAGECAST_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session): (ServiceContext, Option<RecordingSession>) = if let Some(ref cassette) = replay_path
    {
        tracing::debug!(cassette = %cassette, "replaying");
        (ServiceContext::replaying(Path::new(cassette))?, None)
    } else if is_recording {
        tracing::debug!("recording mode enabled");
        let (ctx, session) = ServiceContext::recording();
        (ctx, Some(session))
    } else {
        (ServiceContext::live(), None)
    };

    let response = generate_image(&ctx, &config, args, &cwd).await;

    // The recorder is shared with the transport; release it before writing.
    drop(ctx);
    if let Some(session) = recording_session {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => tracing::warn!("failed to save cassette: {e}"),
        }
    }

    Ok(response)
}

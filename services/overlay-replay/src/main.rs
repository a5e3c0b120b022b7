//! Overlay replay tool.
//!
//! Drives the viewport controller through a recorded session against a live
//! wind API:
//! - Loads marker records and a session of map movements (JSON)
//! - Fetches, caches and prefetches wind overlays as a map would
//! - Prints every published render frame as one JSON line on stdout

mod config;
mod replay;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ReplayConfig;
use viewport::ViewportController;
use wind_client::WindClient;

#[derive(Parser, Debug)]
#[command(name = "overlay-replay")]
#[command(about = "Replay recorded map movements against the wind API")]
struct Args {
    /// Marker records (JSON array)
    #[arg(long)]
    markers: PathBuf,

    /// Recorded session (JSON array of steps)
    #[arg(long)]
    session: PathBuf,

    /// Configuration file (YAML); environment variables are used otherwise
    #[arg(long, env = "OVERLAY_CONFIG")]
    config: Option<PathBuf>,

    /// Wind API base URL, overrides the configuration
    #[arg(long, env = "WIND_API_BASE_URL")]
    base_url: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing; stdout carries the frames
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);
    if args.log_json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    info!("Starting overlay replay");

    let mut config = ReplayConfig::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.wind_api.base_url = base_url;
        config.validate()?;
    }

    let markers = replay::load_markers(&args.markers)?;
    let steps = replay::load_steps(&args.session)?;
    info!(
        markers = markers.len(),
        steps = steps.len(),
        base_url = %config.wind_api.base_url,
        "Loaded session"
    );

    let client = Arc::new(WindClient::new(config.wind_api.clone())?);
    let controller = ViewportController::new(client, config.overlay)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let summary = replay::replay(&controller, markers, steps, &mut out).await?;
    out.flush()?;

    info!(
        steps = summary.steps,
        frames = summary.frames,
        "Done"
    );

    Ok(())
}

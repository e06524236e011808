/*
summarist - main.rs
This binary loads configuration and starts the Rocket HTTP server exposing `POST /summary`.
*/

use clap::Parser;
use common::{Config, Credentials};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use summarist::server::{launch_rocket, AppState};
use summarist::SummaryService;

#[derive(Parser, Debug)]
#[command(name = "summarist", about = "Summarize a video or web page from its URL")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the configured HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Secrets may come from a local .env file
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let mut config = match Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    // Credentials are read once; absence is reported lazily by the components.
    let credentials = Credentials::from_env(&config);

    let service = match SummaryService::from_config(&config, &credentials) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(%e, "failed to initialize summary service");
            return Err(e);
        }
    };
    info!(model = %service.model(), "summary service initialized");

    // Launch the Rocket server (blocking until Rocket shuts down)
    if let Err(e) = launch_rocket(AppState::new(service), &config.server).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}

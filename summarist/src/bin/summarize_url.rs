use clap::Parser;
use common::{Config, Credentials};
use std::path::PathBuf;

use summarist::SummaryService;

/// Run one URL through the summary pipeline and print the JSON reply.
#[derive(Parser, Debug)]
#[command(name = "summarize_url")]
struct Args {
    /// Video or web page URL
    url: String,

    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    let config = match args.config {
        Some(path) => Config::from_file(&path).await?,
        None => Config::default(),
    };
    let credentials = Credentials::from_env(&config);
    let service = SummaryService::from_config(&config, &credentials)?;

    let response = service.respond(&args.url).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

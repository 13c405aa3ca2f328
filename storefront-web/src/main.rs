//! Storefront Web Server
//!
//! Serves the storefront pages behind the edge session gate.

use clap::Parser;
use std::path::PathBuf;
use storefront_core::{StorefrontConfig, StorefrontResult};
use storefront_web::server::StorefrontServerBuilder;
use storefront_web::{init_logging, WebError};
use tracing::{error, info};

/// Storefront Web Server - session-gated storefront and dashboard pages
#[derive(Parser)]
#[command(name = "storefront-web")]
#[command(about = "Storefront pages behind the edge session gate")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Backend base URL (without `/api`)
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (error, warn, info, debug, trace), overrides the configuration
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(args: &Args) -> StorefrontResult<StorefrontConfig> {
    let mut config = match &args.config {
        Some(path) => StorefrontConfig::from_file(path)?,
        None => StorefrontConfig::default(),
    }
    .with_env();

    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(api_url) = &args.api_url {
        config.backend.api_url = api_url.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

async fn run(args: Args) -> Result<(), WebError> {
    let config = load_config(&args)?;
    init_logging(&config.logging)?;

    info!(
        "Starting {} web server v{}",
        config.site_name,
        env!("CARGO_PKG_VERSION")
    );

    let server = StorefrontServerBuilder::from_config(&config).build()?;
    server.start().await
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Server failed: {}", e);
        eprintln!("Server failed: {}", e);
        std::process::exit(1);
    }
}

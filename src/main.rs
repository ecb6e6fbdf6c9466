use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::time::Duration;
use tracing::{error, info};

/// Username reservation server with a landing page and verification stub
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a JSON config file (falls back to CONFIG_PATH, then handle-reserve.json)
    #[arg(long, short = 'c')]
    config: Option<String>,

    /// Port to listen on (overrides HTTP_PORT and the config file)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// Address to bind (overrides BIND_ADDRESS and the config file)
    #[arg(long)]
    bind: Option<String>,
}

mod config;
mod error;
mod logging;
mod reservation;
mod store;
mod verification;
mod web;
mod workflow;

use config::AppConfig;
use workflow::spawn_sweeper;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    logging::init_tracing();

    let config_path = args
        .config
        .or_else(|| std::env::var("CONFIG_PATH").ok())
        .unwrap_or_else(|| "handle-reserve.json".to_string());

    info!("Loading configuration from {}...", config_path);
    let mut config = AppConfig::load(&config_path)?;
    config.apply_env();
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    config.validate()?;

    info!(
        "Site '{}', success window {}ms, lookup timeout {}ms",
        config.site_name, config.success_display_ms, config.availability_timeout_ms
    );
    if config.tls_enabled() {
        info!("TLS enabled");
    }

    // Usernames live in memory only and are lost on restart
    let state = web::build_state(config);
    let sweeper = spawn_sweeper(state.flows.clone(), SWEEP_INTERVAL);

    let result = web::start_web_server(state).await;
    sweeper.abort();

    if let Err(e) = &result {
        error!("Web server error: {}", e);
    }
    info!("Server stopped.");
    result
}

#![forbid(unsafe_code)]

use clap::Parser;
use randgate_lib::{gateway, GatewayContext};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Randgate - authenticated randomness gateway")]
struct Cli {
    /// Path to configuration TOML file (environment variables override it)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = match randgate_lib::config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "failed to load configuration");
            std::process::exit(1);
        }
    };

    info!(
        ?config.listen,
        core_url = %config.core_url,
        vrf_url = %config.vrf_url,
        "configuration loaded"
    );

    let ctx = match GatewayContext::new(config) {
        Ok(ctx) => Arc::new(ctx),
        Err(err) => {
            error!(%err, "failed to initialize gateway");
            std::process::exit(1);
        }
    };

    if let Err(err) = gateway::run(ctx).await {
        error!(%err, "gateway exited with error");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

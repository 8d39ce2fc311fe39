use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use equipment_portal::{config, gateway};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file; without it, configuration is read from
    /// environment variables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the gateway on
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = match args.config.as_deref() {
        Some(path) => config::load(Some(path))?,
        None => config::Config::from_env(),
    };

    let state = gateway::GatewayState::new(Arc::new(cfg));
    let app = gateway::router(state);

    let listener = TcpListener::bind(args.listen).await?;
    info!(addr = %args.listen, "starting equipment gateway");
    axum::serve(listener, app).await?;

    Ok(())
}

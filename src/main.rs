use anyhow::Context;
use clap::Parser;
use inventoryingest::{
    api, auth::ApiKeyGate, config, inventory::MemoryInventory, logging, request_log::RequestLog,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "inventory-ingest",
    about = "HTTP ingestion and query endpoint for inventory scan records"
)]
struct Cli {
    /// Port to listen on (overrides `PORT`).
    #[arg(long)]
    port: Option<u16>,
    /// Directory served at `/` (overrides `STATIC_DIR`).
    #[arg(long)]
    static_dir: Option<PathBuf>,
    /// Env file to load instead of searching for `.env`.
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Tracing reads RUST_LOG and INVENTORY_LOG_FILE, so the env file goes first.
    let env_file =
        config::load_dotenv(cli.env_file.as_deref()).context("failed to load env file")?;
    logging::init_tracing();
    if let Some(path) = &env_file {
        tracing::debug!(path = %path.display(), "Loaded env file");
    }
    config::init_config(|config| {
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(static_dir) = cli.static_dir {
            config.static_dir = static_dir;
        }
    });
    let config = config::get_config();

    let gate = ApiKeyGate::from_config(config);
    if !config.api_key_enforcement {
        tracing::warn!("API key enforcement is off; every request passes the key gate");
    }
    let app = api::create_router(
        Arc::new(MemoryInventory::new()),
        Arc::new(RequestLog::new()),
        gate,
        &config.static_dir,
    );

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, config.port))
        .await
        .with_context(|| format!("failed to bind port {}", config.port))?;
    tracing::info!("Listening on http://0.0.0.0:{}", config.port);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server terminated unexpectedly")?;

    Ok(())
}

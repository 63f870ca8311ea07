use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use device_lending::app::{self, AppState};
use device_lending::config::{self, StorageBackend};
use device_lending::is_production;

#[derive(Parser)]
#[command(name = "device-lending")]
#[command(about = "Device lending administration API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides APP_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Storage backend: postgres or memory (overrides APP_STORAGE)")]
    storage: Option<StorageBackend>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("device_lending=debug,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(storage) = args.storage {
        config.database.storage = storage;
    }
    tracing::info!("Starting Device Lending API in {:?} mode", config.environment);

    if is_production!() && config.database.storage == StorageBackend::Memory {
        tracing::warn!("In-memory storage in production: data is lost on restart");
    }

    let repositories = app::connect_repositories(&config)
        .await
        .context("failed to open storage")?;
    let state = AppState::new(config, &repositories);

    if let (Some(user_name), Some(password)) = (
        state.config.bootstrap.admin_user_name.as_deref(),
        state.config.bootstrap.admin_password.as_deref(),
    ) {
        state
            .services
            .employees
            .ensure_admin(user_name, password)
            .await
            .context("failed to seed bootstrap admin")?;
    }

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Device Lending API listening on http://{}", bind_addr);

    let router = app::router(state);
    axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("server error")?;

    Ok(())
}

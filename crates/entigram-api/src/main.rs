//! entigram-api - HTTP API server for entigram.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use entigram_api::{app, AppState};
use entigram_core::defaults;
use entigram_inference::OllamaBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_root =
        std::env::var("ENTIGRAM_DATA_ROOT").unwrap_or_else(|_| ".".to_string());
    let port: u16 = std::env::var("ENTIGRAM_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults::API_PORT);

    let backend = Arc::new(OllamaBackend::from_env());
    let state = AppState::new(data_root, backend.clone(), backend);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!(%addr, "entigram-api listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;
    Ok(())
}

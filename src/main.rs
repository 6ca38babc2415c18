use anyhow::{Context, Result};
use benchdash::{build_router, config::Config, store::SessionCoordinator, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Read first so that a RUST_LOG from `.env` is honored.
    let config = Config::from_env().context("Failed to read configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let sessions = SessionCoordinator::from_config(&config.storage)
        .context("Failed to set up session storage")?;
    info!(backends = ?sessions.backend_names(), "session storage ready");

    let max_body_size = usize::try_from(config.server.max_upload_size)
        .context("MAX_UPLOAD_SIZE is too large for this platform")?;
    let app = build_router(AppState::new(sessions), max_body_size);

    let address = format!("{}:{}", config.server.address, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("listening on http://{address}");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

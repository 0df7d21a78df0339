use anyhow::Context;
use tokio::net::TcpListener;

use flusso_backend::core::config::Settings;
use flusso_backend::core::logging;
use flusso_backend::server;
use flusso_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env();
    logging::init(&settings);

    tracing::info!("Starting Flusso Knowledge Base API");
    tracing::info!("Store ID: {}", settings.store_id);
    tracing::info!("Frontend dir: {}", settings.frontend_dir.display());
    tracing::info!("Debug mode: {}", settings.debug);

    let state = AppState::initialize(settings);

    let bind_addr = format!("0.0.0.0:{}", state.settings.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app = server::router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

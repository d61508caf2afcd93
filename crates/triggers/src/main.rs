//! FitTogether trigger service binary entrypoint.

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fittogether_common::config::AppConfig;

use fittogether_triggers::routes::create_router;
use fittogether_triggers::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("fittogether_triggers=info,fittogether_notifier=info,tower_http=info")
        }))
        .json()
        .init();

    tracing::info!("Starting FitTogether trigger service...");

    // Credentials are loaded once here and handed to every client
    let config = AppConfig::from_env()?;

    let state = AppState::from_config(&config).await?;

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "Trigger service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    tracing::info!("FitTogether trigger service stopped.");
    Ok(())
}

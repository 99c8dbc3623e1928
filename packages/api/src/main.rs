use std::sync::Arc;

use leychile_api::{build_router, ApiConfig, AppState};
use leychile_harvester::LeyChileClient;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ApiConfig::from_env();

    // The blocking HTTP client must be built off the async runtime.
    let source_config = config.source.clone();
    let built =
        tokio::task::spawn_blocking(move || LeyChileClient::with_config(source_config)).await;
    let client = match built {
        Ok(Ok(client)) => client,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "failed to create HTTP client");
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!(error = %e, "client setup task failed");
            std::process::exit(1);
        }
    };

    let addr = config.bind_addr;
    let app = build_router(AppState::new(Arc::new(client), config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to bind on {addr}");
            std::process::exit(1);
        });
    tracing::info!("listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}

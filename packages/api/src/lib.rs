//! HTTP API serving Chilean statutes article by article.
//!
//! Wraps [`leychile_harvester`] behind a small JSON API with per-key
//! response caches in front of the upstream services.

pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use error::ApiError;
pub use state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/ley", get(handlers::law))
        .route("/ley_articulos_ids", get(handlers::article_ids))
        .route("/ley_articulo_idparte", get(handlers::article_by_part))
        .route("/buscar_global", get(handlers::search))
        .route("/ley_html", get(handlers::law_html))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

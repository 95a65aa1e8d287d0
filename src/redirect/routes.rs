use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{health_check, landing, redirect_link, RedirectState};
use super::middleware::record_request_start;
use super::resolver::RedirectResolver;

/// Redirect-facing router. Named routes are registered ahead of the
/// `/{code}` catch-all so service pages can never be shadowed by a link.
pub fn create_redirect_router(resolver: RedirectResolver) -> Router {
    let state = Arc::new(RedirectState { resolver });

    Router::new()
        .route("/", get(landing))
        .route("/healthz", get(health_check))
        .route("/{code}", get(redirect_link))
        .layer(middleware::from_fn(record_request_start))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

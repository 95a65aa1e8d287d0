use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::{self, Next},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::{session_middleware, SessionVerifier};
use crate::service::ShortenerService;
use crate::storage::LinkStore;

use super::handlers::{create_link, delete_link, health_check, list_links, AppState};

/// API router for the browser frontend. Every `/api/links` request passes
/// through session resolution; the handlers decide whether an anonymous
/// caller is acceptable.
pub fn create_api_router(
    store: Arc<dyn LinkStore>,
    service: ShortenerService,
    verifier: Arc<SessionVerifier>,
) -> Router {
    let state = Arc::new(AppState { store, service });

    let link_routes = Router::new()
        .route("/api/links", post(create_link))
        .route("/api/links", get(list_links))
        .route("/api/links/{id}", delete(delete_link))
        .route_layer(middleware::from_fn(
            move |headers: HeaderMap, req: Request, next: Next| {
                let verifier = Arc::clone(&verifier);
                session_middleware(verifier, headers, req, next)
            },
        ))
        .with_state(state);

    Router::new()
        .route("/api/health", get(health_check))
        .merge(link_routes)
        .layer(CorsLayer::permissive())
}

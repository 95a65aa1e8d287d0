use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;

use super::middleware::RequestStart;
use super::resolver::{RedirectError, RedirectResolver};
use crate::models::ClickAnalytics;

pub struct RedirectState {
    pub resolver: RedirectResolver,
}

/// Resolve a short code and answer with a temporary redirect. Temporary on
/// purpose: a permanent redirect would let browser caches skip the server,
/// and with it the click counter.
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(code): Path<String>,
    Extension(request_start): Extension<RequestStart>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let analytics = ClickAnalytics {
        user_agent: header_value(&headers, header::USER_AGENT),
        referrer: header_value(&headers, header::REFERER),
        ..ClickAnalytics::default()
    };

    match state.resolver.resolve(&code, analytics).await {
        Ok(resolved) => {
            let mut response_headers = HeaderMap::new();
            response_headers.insert(
                "x-linklet-timing-ms",
                request_start.elapsed_ms().to_string().parse().unwrap(),
            );

            tracing::debug!(
                short_code = %resolved.link.short_code,
                clicks = resolved.link.clicks,
                "redirecting"
            );

            (response_headers, Redirect::temporary(&resolved.original_url)).into_response()
        }
        Err(err @ (RedirectError::InvalidCode(_) | RedirectError::NotFound)) => (
            StatusCode::NOT_FOUND,
            format!("{err}. Nothing is shortened under '{code}'."),
        )
            .into_response(),
        Err(RedirectError::Storage(err)) => {
            tracing::error!(short_code = %code, error = %err, "lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Landing route: identifies the service so a bare origin visit is not a
/// failed lookup.
pub async fn landing() -> impl IntoResponse {
    #[derive(Serialize)]
    struct ServiceInfo {
        service: &'static str,
        version: &'static str,
    }

    Json(ServiceInfo {
        service: "linklet",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

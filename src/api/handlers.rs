use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::auth::CurrentSession;
use crate::models::{CreateLinkRequest, ErrorResponse, Link, MessageResponse, ShortenedLink};
use crate::service::{ShortenError, ShortenerService};
use crate::storage::{LinkStore, StoreError};

pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub service: ShortenerService,
}

/// Create a shortened link. Works with or without a session: an
/// unauthenticated caller gets a synthetic per-call owner id.
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<ShortenedLink>), (StatusCode, Json<ErrorResponse>)> {
    // An empty custom code box submits as "", which means "generate one".
    let custom_code = payload
        .custom_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    let result = match &session {
        Some(session) => {
            state
                .service
                .shorten(&payload.url, custom_code, &session.user_id)
                .await
        }
        None => {
            state
                .service
                .shorten_anonymous(&payload.url, custom_code)
                .await
        }
    };

    match result {
        Ok(link) => Ok((StatusCode::CREATED, Json(link))),
        Err(err) => Err(shorten_error_response(err)),
    }
}

fn shorten_error_response(err: ShortenError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, message) = match &err {
        ShortenError::InvalidUrl | ShortenError::InvalidCode(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        ShortenError::CodeTaken => (StatusCode::CONFLICT, err.to_string()),
        ShortenError::GenerationExhausted => {
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        ShortenError::Storage(source) => {
            tracing::error!(error = %source, "link creation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create link".to_string(),
            )
        }
    };

    (status, Json(ErrorResponse { error: message }))
}

/// List the caller's own links. Requires a session.
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<Json<Vec<Link>>, (StatusCode, Json<ErrorResponse>)> {
    let Some(session) = session else {
        return Err(unauthorized());
    };

    match state.store.list_by_user(&session.user_id).await {
        Ok(links) => Ok(Json(links)),
        Err(err) => {
            tracing::error!(error = %err, "listing links failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to list links".to_string(),
                }),
            ))
        }
    }
}

/// Delete a link the caller owns.
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(session) = session else {
        return Err(unauthorized());
    };

    match state.store.delete(id, &session.user_id).await {
        Ok(removed) => Ok(Json(MessageResponse {
            message: format!("Deleted '{}'", removed.short_code),
        })),
        Err(StoreError::NotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Link not found".to_string(),
            }),
        )),
        Err(StoreError::NotOwner) => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "You do not own this link".to_string(),
            }),
        )),
        Err(err) => {
            tracing::error!(link_id = id, error = %err, "delete failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to delete link".to_string(),
                }),
            ))
        }
    }
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "A signed-in session is required".to_string(),
        }),
    )
}

/// Health check endpoint
pub async fn health_check() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "OK".to_string(),
    })
}

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One shortened URL. `clicks` only ever grows and is mutated exclusively
/// through the single-statement increment paths on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Link {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub user_id: String,
    pub created_at: i64,
    pub clicks: i64,
    pub last_clicked_at: Option<i64>,
}

/// Insert payload; `id`, `created_at` and the zeroed counter are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewLink {
    pub short_code: String,
    pub original_url: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    pub url: String,
    pub custom_code: Option<String>,
}

/// Response body for a successful shorten call.
#[derive(Debug, Clone, Serialize)]
pub struct ShortenedLink {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub short_url: String,
    pub created_at: i64,
}

/// Per-visit metadata accepted by the click tracker. Only the counter and
/// timestamp are persisted; everything here is informational and logged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClickAnalytics {
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub ip: Option<String>,
    pub location: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

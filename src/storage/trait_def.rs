use crate::models::{Link, NewLink};
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("short code already exists")]
    Conflict,
    #[error("link not found")]
    NotFound,
    #[error("link is owned by another user")]
    NotOwner,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Data access for the `links` collection. Counter updates must be single
/// atomic statements; callers never hold a lock.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Initialize the storage (create tables and indexes).
    async fn init(&self) -> Result<()>;

    /// Persist a new link with a zeroed click counter. A duplicate short
    /// code yields [`StoreError::Conflict`].
    async fn create(&self, link: NewLink) -> StoreResult<Link>;

    /// Point lookup by short code. Absent is `Ok(None)`, not an error.
    async fn get_by_code(&self, short_code: &str) -> Result<Option<Link>>;

    /// Whether a short code is already taken.
    async fn exists(&self, short_code: &str) -> Result<bool>;

    /// All links owned by `user_id`. Ordering is a presentation nicety,
    /// not part of the contract.
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Link>>;

    /// Primary tracking path: increment `clicks` and stamp
    /// `last_clicked_at` in one update.
    async fn record_click(&self, id: i64, clicked_at: i64) -> Result<()>;

    /// Fallback tracking path: increment `clicks` alone.
    async fn increment_clicks(&self, id: i64) -> Result<()>;

    /// Remove a link after verifying ownership. Returns the removed
    /// record; [`StoreError::NotOwner`] if `requesting_user` is not the
    /// stored owner.
    async fn delete(&self, id: i64, requesting_user: &str) -> StoreResult<Link>;
}

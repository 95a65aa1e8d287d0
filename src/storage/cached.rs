use crate::models::{Link, NewLink};
use crate::storage::{LinkStore, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

/// Read-through cache in front of a [`LinkStore`], sized for the redirect
/// hot path. Click updates are NOT buffered: each one goes straight to the
/// backing store so its atomic increment applies per call. Cached snapshots
/// may lag the live counter by at most the TTL; lookups and uniqueness
/// checks never serve a stale absence for longer than that either.
pub struct CachedLinkStore {
    inner: Arc<dyn LinkStore>,
    read_cache: Cache<String, Option<Link>>,
}

impl CachedLinkStore {
    pub fn new(inner: Arc<dyn LinkStore>, max_entries: u64, ttl_secs: u64) -> Self {
        let read_cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, read_cache }
    }
}

#[async_trait]
impl LinkStore for CachedLinkStore {
    async fn init(&self) -> Result<()> {
        self.inner.init().await
    }

    async fn create(&self, link: NewLink) -> StoreResult<Link> {
        let created = self.inner.create(link).await?;

        self.read_cache
            .insert(created.short_code.clone(), Some(created.clone()))
            .await;

        Ok(created)
    }

    async fn get_by_code(&self, short_code: &str) -> Result<Option<Link>> {
        if let Some(cached) = self.read_cache.get(short_code).await {
            return Ok(cached);
        }

        let result = self.inner.get_by_code(short_code).await?;

        self.read_cache
            .insert(short_code.to_string(), result.clone())
            .await;

        Ok(result)
    }

    async fn exists(&self, short_code: &str) -> Result<bool> {
        // A cached hit answers immediately; a cached miss is re-checked
        // against the store, since uniqueness decisions hang on it.
        if let Some(Some(_)) = self.read_cache.get(short_code).await {
            return Ok(true);
        }

        self.inner.exists(short_code).await
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Link>> {
        self.inner.list_by_user(user_id).await
    }

    async fn record_click(&self, id: i64, clicked_at: i64) -> Result<()> {
        self.inner.record_click(id, clicked_at).await
    }

    async fn increment_clicks(&self, id: i64) -> Result<()> {
        self.inner.increment_clicks(id).await
    }

    async fn delete(&self, id: i64, requesting_user: &str) -> StoreResult<Link> {
        let removed = self.inner.delete(id, requesting_user).await?;
        self.read_cache.invalidate(&removed.short_code).await;
        Ok(removed)
    }
}

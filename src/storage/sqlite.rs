use crate::models::{Link, NewLink};
use crate::storage::{LinkStore, StoreError, StoreResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct SqliteLinkStore {
    pool: Arc<SqlitePool>,
}

impl SqliteLinkStore {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl LinkStore for SqliteLinkStore {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                short_code TEXT NOT NULL UNIQUE,
                original_url TEXT NOT NULL,
                user_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                clicks INTEGER NOT NULL DEFAULT 0,
                last_clicked_at INTEGER
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_short_code ON links(short_code)")
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_user_id ON links(user_id)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create(&self, link: NewLink) -> StoreResult<Link> {
        let created_at = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO links (short_code, original_url, user_id, created_at, clicks)
            VALUES (?, ?, ?, ?, 0)
            ON CONFLICT(short_code) DO NOTHING
            "#,
        )
        .bind(&link.short_code)
        .bind(&link.original_url)
        .bind(&link.user_id)
        .bind(created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }

        let created = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, original_url, user_id, created_at, clicks, last_clicked_at
            FROM links
            WHERE short_code = ?
            "#,
        )
        .bind(&link.short_code)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        Ok(created)
    }

    async fn get_by_code(&self, short_code: &str) -> Result<Option<Link>> {
        let link = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, original_url, user_id, created_at, clicks, last_clicked_at
            FROM links
            WHERE short_code = ?
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn exists(&self, short_code: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM links WHERE short_code = ?",
        )
        .bind(short_code)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count > 0)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Link>> {
        let links = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, original_url, user_id, created_at, clicks, last_clicked_at
            FROM links
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(links)
    }

    async fn record_click(&self, id: i64, clicked_at: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + 1, last_clicked_at = ?
            WHERE id = ?
            "#,
        )
        .bind(clicked_at)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn increment_clicks(&self, id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE links
            SET clicks = clicks + 1
            WHERE id = ?
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn delete(&self, id: i64, requesting_user: &str) -> StoreResult<Link> {
        let existing = sqlx::query_as::<_, Link>(
            r#"
            SELECT id, short_code, original_url, user_id, created_at, clicks, last_clicked_at
            FROM links
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::Other(e.into()))?;

        let link = existing.ok_or(StoreError::NotFound)?;
        if link.user_id != requesting_user {
            return Err(StoreError::NotOwner);
        }

        let result = sqlx::query("DELETE FROM links WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(requesting_user)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| StoreError::Other(e.into()))?;

        // A racing delete may have won between the ownership read and here.
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(link)
    }
}

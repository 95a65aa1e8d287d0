//! Click tracking.
//!
//! Tracking is best-effort by design: the redirect must never wait on or
//! fail because of the counter. The primary path applies the combined
//! increment-and-timestamp update; if that fails the tracker retries with
//! the bare increment, and if that fails too the click is only a log line.

use std::sync::Arc;

use crate::models::ClickAnalytics;
use crate::storage::LinkStore;

pub struct ClickTracker {
    store: Arc<dyn LinkStore>,
}

impl ClickTracker {
    pub fn new(store: Arc<dyn LinkStore>) -> Self {
        Self { store }
    }

    /// Record one click against `link_id`. Each call increments the stored
    /// counter exactly once when any tier succeeds; there is no
    /// deduplication across retries of the same physical visit.
    ///
    /// Analytics fields are logged, never persisted.
    pub async fn record_click(&self, link_id: i64, analytics: ClickAnalytics) {
        tracing::debug!(
            link_id,
            user_agent = analytics.user_agent.as_deref(),
            referrer = analytics.referrer.as_deref(),
            "recording click"
        );

        let clicked_at = chrono::Utc::now().timestamp();

        if let Err(primary_err) = self.store.record_click(link_id, clicked_at).await {
            tracing::warn!(
                link_id,
                error = %primary_err,
                "combined click update failed, falling back to bare increment"
            );

            if let Err(fallback_err) = self.store.increment_clicks(link_id).await {
                tracing::error!(
                    link_id,
                    error = %fallback_err,
                    "click lost: fallback increment failed as well"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Link, NewLink};
    use crate::storage::{LinkStore, StoreResult};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Store stub whose tracking paths can be made to fail independently.
    struct FlakyStore {
        fail_record: bool,
        fail_increment: bool,
        clicks: AtomicI64,
        last_clicked_at: AtomicI64,
    }

    impl FlakyStore {
        fn new(fail_record: bool, fail_increment: bool) -> Self {
            Self {
                fail_record,
                fail_increment,
                clicks: AtomicI64::new(0),
                last_clicked_at: AtomicI64::new(0),
            }
        }
    }

    #[async_trait]
    impl LinkStore for FlakyStore {
        async fn init(&self) -> Result<()> {
            Ok(())
        }

        async fn create(&self, _link: NewLink) -> StoreResult<Link> {
            unimplemented!("not exercised by tracker tests")
        }

        async fn get_by_code(&self, _short_code: &str) -> Result<Option<Link>> {
            Ok(None)
        }

        async fn exists(&self, _short_code: &str) -> Result<bool> {
            Ok(false)
        }

        async fn list_by_user(&self, _user_id: &str) -> Result<Vec<Link>> {
            Ok(vec![])
        }

        async fn record_click(&self, _id: i64, clicked_at: i64) -> Result<()> {
            if self.fail_record {
                return Err(anyhow!("combined update unavailable"));
            }
            self.clicks.fetch_add(1, Ordering::SeqCst);
            self.last_clicked_at.store(clicked_at, Ordering::SeqCst);
            Ok(())
        }

        async fn increment_clicks(&self, _id: i64) -> Result<()> {
            if self.fail_increment {
                return Err(anyhow!("increment unavailable"));
            }
            self.clicks.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn delete(&self, _id: i64, _requesting_user: &str) -> StoreResult<Link> {
            unimplemented!("not exercised by tracker tests")
        }
    }

    #[tokio::test]
    async fn primary_path_increments_and_stamps() {
        let store = Arc::new(FlakyStore::new(false, false));
        let tracker = ClickTracker::new(Arc::clone(&store) as Arc<dyn LinkStore>);

        tracker.record_click(1, ClickAnalytics::default()).await;

        assert_eq!(store.clicks.load(Ordering::SeqCst), 1);
        assert!(store.last_clicked_at.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn falls_back_to_bare_increment() {
        let store = Arc::new(FlakyStore::new(true, false));
        let tracker = ClickTracker::new(Arc::clone(&store) as Arc<dyn LinkStore>);

        tracker.record_click(1, ClickAnalytics::default()).await;

        // Counter moved through the fallback; the timestamp did not.
        assert_eq!(store.clicks.load(Ordering::SeqCst), 1);
        assert_eq!(store.last_clicked_at.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn swallows_double_failure() {
        let store = Arc::new(FlakyStore::new(true, true));
        let tracker = ClickTracker::new(Arc::clone(&store) as Arc<dyn LinkStore>);

        // Must not panic or propagate anything.
        tracker.record_click(1, ClickAnalytics::default()).await;

        assert_eq!(store.clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn each_call_counts_once() {
        let store = Arc::new(FlakyStore::new(false, false));
        let tracker = ClickTracker::new(Arc::clone(&store) as Arc<dyn LinkStore>);

        for _ in 0..5 {
            tracker.record_click(1, ClickAnalytics::default()).await;
        }

        assert_eq!(store.clicks.load(Ordering::SeqCst), 5);
    }
}

//! Short code resolution.
//!
//! One state machine per request: validate the code, look it up, hand the
//! click to the tracker, answer. Tracking runs on a detached task and its
//! outcome never changes the redirect decision.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{ClickAnalytics, Link};
use crate::shortcode;
use crate::storage::LinkStore;
use crate::tracker::ClickTracker;

#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("'{0}' is not a valid short code")]
    InvalidCode(String),
    #[error("Link not found")]
    NotFound,
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Successful resolution. `link.clicks` already includes the click being
/// recorded, regardless of whether the tracking write lands.
#[derive(Debug)]
pub struct ResolvedRedirect {
    pub original_url: String,
    pub link: Link,
}

pub struct RedirectResolver {
    store: Arc<dyn LinkStore>,
    tracker: Arc<ClickTracker>,
}

impl RedirectResolver {
    pub fn new(store: Arc<dyn LinkStore>, tracker: Arc<ClickTracker>) -> Self {
        Self { store, tracker }
    }

    pub async fn resolve(
        &self,
        code: &str,
        analytics: ClickAnalytics,
    ) -> Result<ResolvedRedirect, RedirectError> {
        if shortcode::validate_code(code).is_err() {
            return Err(RedirectError::InvalidCode(code.to_string()));
        }

        let link = self
            .store
            .get_by_code(code)
            .await
            .map_err(RedirectError::Storage)?
            .ok_or(RedirectError::NotFound)?;

        let tracker = Arc::clone(&self.tracker);
        let link_id = link.id;
        tokio::spawn(async move {
            tracker.record_click(link_id, analytics).await;
        });

        let mut snapshot = link;
        snapshot.clicks += 1;

        Ok(ResolvedRedirect {
            original_url: snapshot.original_url.clone(),
            link: snapshot,
        })
    }
}

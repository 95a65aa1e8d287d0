//! URL shortening.
//!
//! Validates and normalizes the submitted URL, resolves a custom or
//! generated short code, and persists the link. Uniqueness is checked here
//! and backed by the store's unique constraint, so a racing create loses
//! cleanly with [`ShortenError::CodeTaken`] instead of clobbering anything.

use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::models::{NewLink, ShortenedLink};
use crate::shortcode::{self, CodeViolation, GenerationError};
use crate::storage::{LinkStore, StoreError};

#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("not a valid http(s) URL")]
    InvalidUrl,
    #[error(transparent)]
    InvalidCode(#[from] CodeViolation),
    #[error("short code already taken")]
    CodeTaken,
    #[error("could not allocate an unused short code")]
    GenerationExhausted,
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

pub struct ShortenerService {
    store: Arc<dyn LinkStore>,
    base_url: String,
}

impl ShortenerService {
    /// `base_url` is the public origin short links are served from, e.g.
    /// `https://lnk.example.net`.
    pub fn new(store: Arc<dyn LinkStore>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { store, base_url }
    }

    pub async fn shorten(
        &self,
        original_url: &str,
        custom_code: Option<&str>,
        user_id: &str,
    ) -> Result<ShortenedLink, ShortenError> {
        let normalized = normalize_url(original_url)?;

        let short_code = match custom_code {
            Some(custom) => {
                shortcode::validate_code(custom)?;
                let taken = self
                    .store
                    .exists(custom)
                    .await
                    .map_err(ShortenError::Storage)?;
                if taken {
                    return Err(ShortenError::CodeTaken);
                }
                custom.to_string()
            }
            None => shortcode::generate_unique_code(self.store.as_ref())
                .await
                .map_err(|e| match e {
                    GenerationError::Exhausted(_) => ShortenError::GenerationExhausted,
                    GenerationError::Storage(err) => ShortenError::Storage(err),
                })?,
        };

        let link = self
            .store
            .create(NewLink {
                short_code,
                original_url: normalized,
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|e| match e {
                // The exists() check raced another creator; same outcome.
                StoreError::Conflict => ShortenError::CodeTaken,
                other => ShortenError::Storage(anyhow::Error::new(other)),
            })?;

        tracing::info!(
            short_code = %link.short_code,
            user_id = %link.user_id,
            "created short link"
        );

        Ok(ShortenedLink {
            id: link.id,
            original_url: link.original_url,
            short_url: self.short_url(&link.short_code),
            short_code: link.short_code,
            created_at: link.created_at,
        })
    }

    /// Shorten without a session: the owner is a synthetic per-call id, so
    /// the record still satisfies the ownership rules for listing/delete.
    pub async fn shorten_anonymous(
        &self,
        original_url: &str,
        custom_code: Option<&str>,
    ) -> Result<ShortenedLink, ShortenError> {
        let user_id = format!("anonymous-{}", chrono::Utc::now().timestamp());
        self.shorten(original_url, custom_code, &user_id).await
    }

    fn short_url(&self, code: &str) -> String {
        format!("{}/{}", self.base_url, code)
    }
}

/// Trim, default the scheme to https, and require an absolute http(s) URL.
fn normalize_url(input: &str) -> Result<String, ShortenError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ShortenError::InvalidUrl);
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&candidate).map_err(|_| ShortenError::InvalidUrl)?;
    match parsed.scheme() {
        "http" | "https" => Ok(candidate),
        _ => Err(ShortenError::InvalidUrl),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteLinkStore;

    async fn service() -> ShortenerService {
        let store = SqliteLinkStore::new("sqlite::memory:", 1).await.unwrap();
        store.init().await.unwrap();
        ShortenerService::new(Arc::new(store), "http://localhost:3000/")
    }

    #[test]
    fn normalization_defaults_scheme_and_trims() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(
            normalize_url("  https://example.com/page  ").unwrap(),
            "https://example.com/page"
        );
        assert_eq!(
            normalize_url("http://example.com").unwrap(),
            "http://example.com"
        );
    }

    #[test]
    fn normalization_rejects_junk() {
        for input in ["", "   ", "ftp://example.com", "http://", "https://exa mple.com"] {
            assert!(
                matches!(normalize_url(input), Err(ShortenError::InvalidUrl)),
                "{input:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn shortens_bare_domain() {
        let service = service().await;

        let link = service.shorten("example.com", None, "u1").await.unwrap();

        assert_eq!(link.original_url, "https://example.com");
        assert_eq!(link.short_code.len(), crate::shortcode::CODE_LENGTH);
        assert!(link
            .short_code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(
            link.short_url,
            format!("http://localhost:3000/{}", link.short_code)
        );
    }

    #[tokio::test]
    async fn custom_code_round_trip_and_conflict() {
        let service = service().await;

        let link = service
            .shorten("https://example.com", Some("my-link"), "u1")
            .await
            .unwrap();
        assert_eq!(link.short_code, "my-link");

        let err = service
            .shorten("https://example.org", Some("my-link"), "u2")
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenError::CodeTaken));
    }

    #[tokio::test]
    async fn reserved_custom_code_is_rejected() {
        let service = service().await;

        let err = service
            .shorten("https://example.com", Some("admin"), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenError::InvalidCode(_)));
    }

    #[tokio::test]
    async fn anonymous_owner_is_synthesized() {
        let service = service().await;

        let link = service
            .shorten_anonymous("https://example.com", None)
            .await
            .unwrap();

        let stored = service.store.get_by_code(&link.short_code).await.unwrap();
        assert!(stored.unwrap().user_id.starts_with("anonymous-"));
    }
}

//! JWKS retrieval and caching for the identity provider's signing keys.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use jsonwebtoken::DecodingKey;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::config::JwtConfig;

pub(super) struct KeySet {
    http: Client,
    jwks_url: String,
    ttl: Duration,
    state: RwLock<KeyState>,
}

#[derive(Default)]
struct KeyState {
    keys: HashMap<String, Arc<DecodingKey>>,
    fetched_at: Option<Instant>,
}

impl KeySet {
    /// Resolve the JWKS endpoint (explicit setting or OIDC discovery) and
    /// prime the key cache so the first request pays no fetch latency.
    pub(super) async fn bootstrap(config: &JwtConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("linklet/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client for JWKS retrieval")?;

        let jwks_url = match &config.jwks_url {
            Some(url) => url.clone(),
            None => discover_jwks_url(&http, &config.issuer_url).await?,
        };

        let set = Self {
            http,
            jwks_url,
            ttl: Duration::from_secs(config.jwks_cache_ttl_secs.max(60)),
            state: RwLock::new(KeyState::default()),
        };
        set.refresh().await?;
        Ok(set)
    }

    pub(super) async fn decoding_key(&self, kid: &str) -> Result<Arc<DecodingKey>> {
        if self.stale().await {
            self.refresh().await?;
        }

        if let Some(key) = self.state.read().await.keys.get(kid) {
            return Ok(Arc::clone(key));
        }

        // Unknown kid usually means the provider rotated keys; fetch once
        // more before giving up.
        self.refresh().await?;
        self.state
            .read()
            .await
            .keys
            .get(kid)
            .cloned()
            .ok_or_else(|| anyhow!("no JWKS entry for key id '{kid}'"))
    }

    async fn stale(&self) -> bool {
        match self.state.read().await.fetched_at {
            Some(at) => at.elapsed() > self.ttl,
            None => true,
        }
    }

    async fn refresh(&self) -> Result<()> {
        let document: JwksDocument = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .context("failed to request JWKS")?
            .error_for_status()
            .context("JWKS endpoint returned an error status")?
            .json()
            .await
            .context("failed to parse JWKS response")?;

        let mut keys: HashMap<String, Arc<DecodingKey>> = HashMap::new();
        for jwk in document.keys {
            let Some(kid) = jwk.kid else {
                tracing::warn!("skipping JWKS entry without 'kid'");
                continue;
            };
            if jwk.kty != "RSA" {
                tracing::warn!(kty = %jwk.kty, "skipping non-RSA JWKS entry");
                continue;
            }
            let n = jwk
                .n
                .as_deref()
                .ok_or_else(|| anyhow!("JWKS RSA key missing modulus"))?;
            let e = jwk
                .e
                .as_deref()
                .ok_or_else(|| anyhow!("JWKS RSA key missing exponent"))?;
            let key = DecodingKey::from_rsa_components(n, e)
                .context("failed to build decoding key from JWKS entry")?;
            keys.insert(kid, Arc::new(key));
        }

        if keys.is_empty() {
            bail!("JWKS response contained no usable keys");
        }

        let mut state = self.state.write().await;
        state.keys = keys;
        state.fetched_at = Some(Instant::now());

        Ok(())
    }
}

async fn discover_jwks_url(http: &Client, issuer_url: &str) -> Result<String> {
    let issuer = issuer_url.trim_end_matches('/');
    let discovery_url = format!("{issuer}/.well-known/openid-configuration");

    let metadata: ProviderMetadata = http
        .get(&discovery_url)
        .send()
        .await
        .context("failed to request provider metadata")?
        .error_for_status()
        .context("provider metadata endpoint returned an error status")?
        .json()
        .await
        .context("failed to parse provider metadata")?;

    metadata
        .jwks_uri
        .ok_or_else(|| anyhow!("provider metadata did not include 'jwks_uri'"))
}

#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    jwks_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    #[serde(default)]
    kty: String,
    #[serde(default)]
    n: Option<String>,
    #[serde(default)]
    e: Option<String>,
}

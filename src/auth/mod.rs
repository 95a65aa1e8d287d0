//! Session verification.
//!
//! Sign-up, sign-in and session issuance belong to the managed identity
//! provider; this module only consumes its contract by validating the
//! bearer tokens it mints. With no provider configured (`AuthMode::None`,
//! the demo sentinel) every request is granted a shared local identity.

mod jwks;

use anyhow::{anyhow, bail, Context, Result};
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::{AuthConfig, AuthMode, JwtConfig};
use jwks::KeySet;

/// Identity of the `LOCAL` single-user mode.
const LOCAL_USER_ID: &str = "demo-user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Request extension carrying the caller's identity, if any. Handlers
/// decide whether an absent session is acceptable.
#[derive(Clone)]
pub struct CurrentSession(pub Option<Session>);

pub struct SessionVerifier {
    mode: VerifierMode,
}

enum VerifierMode {
    Local,
    Jwt(JwtVerifier),
}

impl SessionVerifier {
    pub async fn new(config: &AuthConfig) -> Result<Self> {
        let mode = match config.mode {
            AuthMode::None => VerifierMode::Local,
            AuthMode::Jwt => {
                let jwt = config
                    .jwt
                    .as_ref()
                    .context("AUTH_MODE=jwt requires issuer/audience settings")?;
                VerifierMode::Jwt(JwtVerifier::new(jwt).await?)
            }
        };
        Ok(Self { mode })
    }

    pub fn demo_mode(&self) -> bool {
        matches!(self.mode, VerifierMode::Local)
    }

    /// Resolve the caller's session from the `Authorization` header.
    /// Verification failures are logged and treated as "no session";
    /// handlers that need one answer 401.
    pub async fn identify(&self, headers: &HeaderMap) -> Option<Session> {
        match &self.mode {
            VerifierMode::Local => Some(Session {
                user_id: LOCAL_USER_ID.to_string(),
            }),
            VerifierMode::Jwt(verifier) => {
                let token = bearer_token(headers)?;
                match verifier.verify(token).await {
                    Ok(session) => Some(session),
                    Err(err) => {
                        tracing::warn!(error = %err, "rejected bearer token");
                        None
                    }
                }
            }
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Attach [`CurrentSession`] to every request passing through.
pub async fn session_middleware(
    verifier: Arc<SessionVerifier>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Response {
    let session = verifier.identify(&headers).await;
    request.extensions_mut().insert(CurrentSession(session));
    next.run(request).await
}

#[derive(Debug, Deserialize)]
struct SessionClaims {
    sub: String,
}

struct JwtVerifier {
    issuer: String,
    audience: String,
    keys: KeySet,
}

impl JwtVerifier {
    async fn new(config: &JwtConfig) -> Result<Self> {
        Ok(Self {
            issuer: config.issuer_url.clone(),
            audience: config.audience.clone(),
            keys: KeySet::bootstrap(config).await?,
        })
    }

    async fn verify(&self, token: &str) -> Result<Session> {
        let header = decode_header(token).context("malformed token header")?;
        if !matches!(
            header.alg,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
        ) {
            bail!("unsupported token algorithm {:?}", header.alg);
        }

        let kid = header
            .kid
            .ok_or_else(|| anyhow!("token header missing 'kid'"))?;
        let key = self.keys.decoding_key(&kid).await?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        let data = decode::<SessionClaims>(token, &key, &validation)
            .context("token failed validation")?;

        Ok(Session {
            user_id: data.claims.sub,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;

    #[tokio::test]
    async fn local_mode_grants_shared_identity() {
        let verifier = SessionVerifier::new(&AuthConfig {
            mode: AuthMode::None,
            jwt: None,
        })
        .await
        .unwrap();

        assert!(verifier.demo_mode());

        let session = verifier.identify(&HeaderMap::new()).await.unwrap();
        assert_eq!(session.user_id, LOCAL_USER_ID);
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc.def.ghi".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Basic dXNlcg==".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}

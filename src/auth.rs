//! Bearer-token authentication middleware
//!
//! Token verification is delegated: either to static token->user mappings
//! from the environment, or to the external identity provider's verify
//! endpoint. Verified identities are cached in an explicit [`TokenCache`]
//! owned by the verifier (constructed once at startup, invalidated on
//! demand) rather than in module-level mutable state.
//!
//! The resolved owner id is inserted as a request extension; handlers
//! thread it explicitly into every store and facade call.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{is_production, AuthConfig, AuthMode};
use crate::validation;

/// Resolved owner identity, inserted as a request extension
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Authentication errors
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    NotConfigured,
    ProviderUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Missing Authorization: Bearer header",
            ),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid bearer token"),
            AuthError::NotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Authentication not configured. Set TASKNEST_AUTH_TOKENS or TASKNEST_AUTH_MODE=remote.",
            ),
            AuthError::ProviderUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Identity provider unavailable",
            ),
        };

        (status, message).into_response()
    }
}

/// Constant-time string comparison to prevent timing attacks
///
/// Note: This leaks the length of the shorter string, which is acceptable
/// for bearer tokens where lengths are not secret.
fn constant_time_compare(a: &str, b: &str) -> bool {
    let mut result = (a.len() ^ b.len()) as u8;

    let min_len = std::cmp::min(a.len(), b.len());
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    for i in 0..min_len {
        result |= a_bytes[i] ^ b_bytes[i];
    }

    result == 0
}

/// A cached, verified identity
#[derive(Debug, Clone)]
struct CachedIdentity {
    user_id: String,
    expires_at: DateTime<Utc>,
}

/// Explicit cache for verified identities, keyed by token.
///
/// Constructed once per verifier; `invalidate_all` supports key rotation
/// at the identity provider.
#[derive(Debug, Default)]
pub struct TokenCache {
    entries: DashMap<String, CachedIdentity>,
}

impl TokenCache {
    fn get_fresh(&self, token: &str) -> Option<String> {
        let entry = self.entries.get(token)?;
        if entry.expires_at > Utc::now() {
            Some(entry.user_id.clone())
        } else {
            drop(entry);
            self.entries.remove(token);
            None
        }
    }

    fn insert(&self, token: &str, user_id: &str, ttl: Duration) {
        self.entries.insert(
            token.to_string(),
            CachedIdentity {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
    }

    /// Drop all cached identities (e.g. after provider key rotation)
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Token verifier with delegated verification and an explicit cache
pub struct TokenVerifier {
    mode: AuthMode,
    /// token -> user_id mappings (static mode)
    static_tokens: HashMap<String, String>,
    /// Identity provider base URL (remote mode)
    identity_provider_url: String,
    cache_ttl: Duration,
    cache: TokenCache,
    client: reqwest::Client,
}

/// Shape of the identity provider's verify response
#[derive(serde::Deserialize)]
struct VerifyResponse {
    sub: String,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let static_tokens = parse_static_tokens(&config.static_tokens);

        if config.mode == AuthMode::Static && static_tokens.is_empty() {
            if is_production() {
                tracing::error!("TASKNEST_AUTH_TOKENS not set in production mode");
            } else {
                tracing::warn!(
                    "TASKNEST_AUTH_TOKENS not set - dev mode treats the bearer token as the user id (not for production!)"
                );
            }
        }

        Self {
            mode: config.mode.clone(),
            static_tokens,
            identity_provider_url: config.identity_provider_url.clone(),
            cache_ttl: Duration::seconds(config.cache_ttl_seconds as i64),
            cache: TokenCache::default(),
            client: reqwest::Client::new(),
        }
    }

    /// Access the identity cache (for invalidation on key rotation)
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Verify a bearer token and resolve the owner id
    pub async fn verify(&self, token: &str) -> Result<String, AuthError> {
        match self.mode {
            AuthMode::Static => self.verify_static(token),
            AuthMode::Remote => self.verify_remote(token).await,
        }
    }

    fn verify_static(&self, token: &str) -> Result<String, AuthError> {
        if self.static_tokens.is_empty() {
            if is_production() {
                return Err(AuthError::NotConfigured);
            }
            // Dev fallback: the token itself names the user
            return match validation::validate_user_id(token) {
                Ok(()) => Ok(token.to_string()),
                Err(_) => Err(AuthError::InvalidToken),
            };
        }

        // Constant-time scan; no early exit on match
        let mut found: Option<&str> = None;
        for (known, user_id) in &self.static_tokens {
            if constant_time_compare(known, token) {
                found = Some(user_id);
            }
        }

        found.map(str::to_string).ok_or(AuthError::InvalidToken)
    }

    async fn verify_remote(&self, token: &str) -> Result<String, AuthError> {
        if let Some(user_id) = self.cache.get_fresh(token) {
            return Ok(user_id);
        }

        let url = format!("{}/api/auth/verify", self.identity_provider_url);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity provider request failed");
                AuthError::ProviderUnavailable
            })?;

        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Err(AuthError::InvalidToken);
        }

        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "Unexpected identity provider response");
            return Err(AuthError::ProviderUnavailable);
        }

        let verified: VerifyResponse = resp.json().await.map_err(|e| {
            tracing::warn!(error = %e, "Malformed identity provider response");
            AuthError::ProviderUnavailable
        })?;

        if validation::validate_user_id(&verified.sub).is_err() {
            return Err(AuthError::InvalidToken);
        }

        self.cache.insert(token, &verified.sub, self.cache_ttl);
        Ok(verified.sub)
    }
}

/// Parse "token:user_id" pairs, comma separated
fn parse_static_tokens(raw: &str) -> HashMap<String, String> {
    let mut tokens = HashMap::new();

    for pair in raw.split(',') {
        let pair = pair.trim();
        if pair.is_empty() {
            continue;
        }

        match pair.split_once(':') {
            Some((token, user_id))
                if !token.is_empty() && validation::validate_user_id(user_id).is_ok() =>
            {
                tokens.insert(token.to_string(), user_id.to_string());
            }
            _ => {
                tracing::warn!("Ignoring malformed TASKNEST_AUTH_TOKENS entry (want token:user_id)");
            }
        }
    }

    tokens
}

/// Paths that bypass authentication (probes and metrics scraping)
fn is_public_path(path: &str) -> bool {
    path == "/health" || path.starts_with("/health/") || path == "/metrics"
}

/// Authentication middleware
pub async fn auth_middleware(
    State(verifier): State<Arc<TokenVerifier>>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public_path(request.uri().path()) {
        return next.run(request).await;
    }

    let token = match request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
    {
        Some(token) => token,
        None => return AuthError::MissingToken.into_response(),
    };

    match verifier.verify(&token).await {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthUser(user_id));
            next.run(request).await
        }
        Err(e) => {
            crate::metrics::AUTH_FAILURES_TOTAL.inc();
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_verifier(tokens: &str) -> TokenVerifier {
        TokenVerifier::new(&AuthConfig {
            mode: AuthMode::Static,
            identity_provider_url: String::new(),
            static_tokens: tokens.to_string(),
            cache_ttl_seconds: 60,
        })
    }

    #[tokio::test]
    async fn test_static_tokens_resolve_users() {
        let verifier = static_verifier("tok-a:alice,tok-b:bob");

        assert_eq!(verifier.verify("tok-a").await.unwrap(), "alice");
        assert_eq!(verifier.verify("tok-b").await.unwrap(), "bob");
        assert!(verifier.verify("tok-c").await.is_err());
    }

    #[tokio::test]
    async fn test_dev_fallback_uses_token_as_user() {
        let verifier = static_verifier("");
        assert_eq!(verifier.verify("alice").await.unwrap(), "alice");
        // Invalid user ids are rejected even in dev mode
        assert!(verifier.verify("a:b").await.is_err());
    }

    #[test]
    fn test_parse_static_tokens_skips_malformed() {
        let tokens = parse_static_tokens("good:alice, bad-entry ,also:bob");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.get("good").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_token_cache_expiry() {
        let cache = TokenCache::default();
        cache.insert("t", "alice", Duration::seconds(-1));
        assert!(cache.get_fresh("t").is_none());

        cache.insert("t", "alice", Duration::seconds(60));
        assert_eq!(cache.get_fresh("t").as_deref(), Some("alice"));

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    #[test]
    fn test_public_paths() {
        assert!(is_public_path("/health"));
        assert!(is_public_path("/health/ready"));
        assert!(is_public_path("/metrics"));
        assert!(!is_public_path("/api/v1/tasks"));
    }
}

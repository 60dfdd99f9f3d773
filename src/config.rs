//! Configuration management for Tasknest
//!
//! All configurable parameters in one place with environment variable
//! overrides. Sensible defaults, configurable in production.

use std::env;
use std::path::PathBuf;
use tracing::info;

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Allowed origins (empty = allow all)
    pub allowed_origins: Vec<String>,
    /// Allowed HTTP methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache (seconds)
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(), // Empty = allow all origins
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PUT".to_string(),
                "PATCH".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
            ],
            max_age_seconds: 86400,
        }
    }
}

impl CorsConfig {
    /// Load from environment variables with production safety checks
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(origins) = env::var("TASKNEST_CORS_ORIGINS") {
            config.allowed_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(val) = env::var("TASKNEST_CORS_MAX_AGE") {
            if let Ok(n) = val.parse() {
                config.max_age_seconds = n;
            }
        }

        if is_production() && config.allowed_origins.is_empty() {
            tracing::warn!(
                "PRODUCTION WARNING: CORS allows all origins. Set TASKNEST_CORS_ORIGINS for security."
            );
        }

        config
    }

    /// Convert to tower-http CorsLayer
    pub fn to_layer(&self) -> tower_http::cors::CorsLayer {
        use tower_http::cors::{AllowOrigin, Any, CorsLayer};

        let mut layer = CorsLayer::new();

        if self.allowed_origins.is_empty() {
            layer = layer.allow_origin(Any);
        } else {
            let mut valid_origins = Vec::new();

            for origin_str in &self.allowed_origins {
                match origin_str.parse::<axum::http::HeaderValue>() {
                    Ok(origin) => valid_origins.push(origin),
                    Err(_) => {
                        tracing::warn!("CORS: Invalid origin '{}' - skipping", origin_str);
                    }
                }
            }

            if valid_origins.is_empty() {
                // All configured origins failed to parse - reject all
                // cross-origin requests rather than falling back to permissive.
                tracing::error!(
                    "CORS: All {} configured origin(s) failed to parse. \
                     Rejecting all cross-origin requests. Fix TASKNEST_CORS_ORIGINS.",
                    self.allowed_origins.len()
                );
                layer =
                    layer.allow_origin(AllowOrigin::list(Vec::<axum::http::HeaderValue>::new()));
            } else {
                layer = layer.allow_origin(AllowOrigin::list(valid_origins));
            }
        }

        let methods: Vec<axum::http::Method> = self
            .allowed_methods
            .iter()
            .filter_map(|m| m.parse().ok())
            .collect();
        let headers: Vec<axum::http::HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        layer
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(std::time::Duration::from_secs(self.max_age_seconds))
    }
}

/// Authentication mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// Static token -> user mappings from TASKNEST_AUTH_TOKENS
    Static,
    /// Delegate verification to the identity provider's verify endpoint
    Remote,
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,
    /// Base URL of the external identity provider (remote mode)
    pub identity_provider_url: String,
    /// Static "token:user_id" pairs, comma separated (static mode)
    pub static_tokens: String,
    /// How long verified identities stay cached (remote mode)
    pub cache_ttl_seconds: u64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let mode = match env::var("TASKNEST_AUTH_MODE").as_deref() {
            Ok("remote") => AuthMode::Remote,
            _ => AuthMode::Static,
        };

        Self {
            mode,
            identity_provider_url: env::var("TASKNEST_IDENTITY_PROVIDER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            static_tokens: env::var("TASKNEST_AUTH_TOKENS").unwrap_or_default(),
            cache_ttl_seconds: env::var("TASKNEST_AUTH_CACHE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to
    pub port: u16,
    /// Base path for RocksDB storage
    pub storage_path: PathBuf,
    /// Rate limiting: sustained requests per second
    pub rate_limit_per_second: u64,
    /// Rate limiting: burst size
    pub rate_limit_burst: u32,
    /// Max concurrent in-flight requests
    pub max_concurrent_requests: usize,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3030,
            storage_path: PathBuf::from("./tasknest_data"),
            rate_limit_per_second: 50,
            rate_limit_burst: 100,
            max_concurrent_requests: 512,
            cors: CorsConfig::default(),
            auth: AuthConfig::from_env(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = env::var("TASKNEST_PORT") {
            if let Ok(port) = val.parse() {
                config.port = port;
            }
        }

        if let Ok(val) = env::var("TASKNEST_STORAGE_PATH") {
            config.storage_path = PathBuf::from(val);
        }

        if let Ok(val) = env::var("TASKNEST_RATE_LIMIT_PER_SECOND") {
            if let Ok(n) = val.parse() {
                config.rate_limit_per_second = n;
            }
        }

        if let Ok(val) = env::var("TASKNEST_RATE_LIMIT_BURST") {
            if let Ok(n) = val.parse() {
                config.rate_limit_burst = n;
            }
        }

        if let Ok(val) = env::var("TASKNEST_MAX_CONCURRENT_REQUESTS") {
            if let Ok(n) = val.parse() {
                config.max_concurrent_requests = n;
            }
        }

        config.cors = CorsConfig::from_env();
        config.auth = AuthConfig::from_env();

        config
    }

    /// Log the effective configuration at startup
    pub fn log(&self) {
        info!(
            port = self.port,
            storage_path = %self.storage_path.display(),
            rate_limit_per_second = self.rate_limit_per_second,
            rate_limit_burst = self.rate_limit_burst,
            max_concurrent_requests = self.max_concurrent_requests,
            auth_mode = ?self.auth.mode,
            "Server configuration loaded"
        );
    }
}

/// Whether the server is running in production mode (TASKNEST_ENV)
pub fn is_production() -> bool {
    env::var("TASKNEST_ENV")
        .map(|v| {
            let v = v.to_lowercase();
            v == "production" || v == "prod"
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3030);
        assert!(config.rate_limit_per_second > 0);
        assert!(config.max_concurrent_requests > 0);
    }

    #[test]
    fn test_default_cors_permissive() {
        let cors = CorsConfig::default();
        assert!(cors.allowed_origins.is_empty());
        assert!(cors.allowed_methods.contains(&"PATCH".to_string()));
    }
}

//! Relay configuration.

use crate::rate_limit::RateLimitConfig;
use serde::Deserialize;

/// Operator login credentials. The password is stored as a SHA-256 hex
/// digest; plaintext never appears in configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorCredentials {
    pub username: String,
    pub password_sha256: String,
}

impl Default for OperatorCredentials {
    fn default() -> Self {
        // Matches the factory-seeded dashboard login. Override in deployment.
        Self {
            username: "admin".to_string(),
            password_sha256: "03ac674216f3e15c761ee1a5e255f067953623c8b388b4459e13f978d7c846f4"
                .to_string(),
        }
    }
}

/// Relay service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen address for the HTTP server
    pub bind_addr: String,
    /// SQLite database file
    pub database_path: String,
    /// Where unauthenticated operator requests are redirected
    pub login_redirect: String,
    /// Where a successful login lands
    pub dashboard_redirect: String,
    /// Seeded operator account
    pub operator: OperatorCredentials,
    /// Rate limiting knobs
    pub rate_limit: RateLimitConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            database_path: "pid_system.db".to_string(),
            login_redirect: "/login.html".to_string(),
            dashboard_redirect: "/dashboard.html".to_string(),
            operator: OperatorCredentials::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Load from `relay.toml` (optional) with `RELAY_*` environment
    /// overrides, falling back to defaults field by field.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("relay").required(false))
            .add_source(config::Environment::with_prefix("RELAY").separator("__"))
            .build()?
            .try_deserialize()
    }
}

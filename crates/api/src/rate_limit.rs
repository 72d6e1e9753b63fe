//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Per-IP rate limiting via tower_governor. The Generic Cell Rate
//! Algorithm enforces the quota without background sweeps, which matters
//! here because the device posts on a tight loop and the dashboard polls
//! every couple of seconds.

use governor::middleware::StateInformationMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Type alias for the governor config with default settings
/// StateInformationMiddleware is used when use_headers() is called to add X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds per replenished request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,  // Replenish 1 per second
            burst_size: 10, // Device post + dashboard poll can overlap
        }
    }
}

/// Create a rate limiting governor config
///
/// Returns an Arc wrapped config that can be used with GovernorLayer.
/// Uses PeerIpKeyExtractor by default. Requires service to use
/// `into_make_service_with_connect_info::<SocketAddr>()` for IP extraction.
///
/// Adds X-RateLimit-* headers to responses for quota visibility.
pub fn create_governor_config(config: &RateLimitConfig) -> Arc<DefaultGovernorConfig> {
    Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.per_second)
            .burst_size(config.burst_size)
            .use_headers() // Adds X-RateLimit-After, X-RateLimit-Limit, X-RateLimit-Remaining
            .finish()
            .unwrap(),
    )
}

use std::env;
use std::num::NonZeroU32;

use governor::Quota;

/// Rate limit configuration for the API.
///
/// These three knobs are the only externally tunable parts of the limiter.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Global enable/disable switch.
    pub enabled: bool,
    /// Sustained requests per second allowed for a single client.
    pub requests_per_second: u32,
    /// Maximum requests a single client may issue in one burst.
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: 2,
            burst: 4,
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: env::var("RATE_LIMIT_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
            requests_per_second: env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            burst: env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
        }
    }

    /// Token bucket quota for a single client. Zero values are clamped to
    /// one, since an all-zero quota cannot be represented.
    pub fn quota(&self) -> Quota {
        let rps = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst).unwrap_or(rps);

        Quota::per_second(rps).allow_burst(burst)
    }
}

//! Per-client IP rate limiting.
//!
//! Each client IP owns an independent token bucket, created lazily on first
//! sight and removed by a background sweep once the client has been idle for
//! three minutes, so one-off scanners do not grow the registry without bound.
//!
//! This limiter is single-process and in-memory. Behind a load balancer with
//! several application servers, rate limiting belongs in the proxy layer or a
//! shared store like Redis instead.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use governor::{DefaultDirectRateLimiter, RateLimiter};

use crate::config::rate_limit::RateLimitConfig;
use crate::state::AppState;
use crate::utils::errors::AppError;

/// How often the background sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Clients idle for longer than this are evicted.
const IDLE_AFTER: Duration = Duration::from_secs(180);

struct Client {
    limiter: DefaultDirectRateLimiter,
    last_seen: Instant,
}

/// Registry of per-client token buckets.
///
/// All access goes through one mutex: bucket fetch-or-insert, token
/// consumption and the eviction sweep are mutually exclusive, so a bucket is
/// never read concurrently with its own removal and two concurrent requests
/// from the same client cannot race on its token count. The lock is held only
/// for the registry critical section, never across an `.await` and never
/// while downstream handlers run.
pub struct ClientRegistry {
    config: RateLimitConfig,
    clients: Mutex<HashMap<IpAddr, Client>>,
}

impl ClientRegistry {
    pub fn new(config: RateLimitConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            clients: Mutex::new(HashMap::new()),
        })
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Spawns the background task that evicts idle clients once per minute.
    pub fn spawn_eviction(self: &Arc<Self>) {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                registry.sweep(IDLE_AFTER);
            }
        });
    }

    /// Records one request from `ip` and reports whether it may proceed.
    ///
    /// The first sight of an address inserts a fresh bucket with the
    /// configured burst capacity. `last_seen` is refreshed on every call,
    /// allowed or rejected, since the sweep keys eviction off it. Rejection
    /// is immediate; requests are never queued or delayed.
    pub fn allow(&self, ip: IpAddr) -> bool {
        if !self.config.enabled {
            return true;
        }

        let mut clients = self.clients.lock().expect("client registry lock poisoned");

        let client = clients.entry(ip).or_insert_with(|| Client {
            limiter: RateLimiter::direct(self.config.quota()),
            last_seen: Instant::now(),
        });

        client.last_seen = Instant::now();
        client.limiter.check().is_ok()
    }

    /// Removes every client not seen within `idle_after`.
    fn sweep(&self, idle_after: Duration) {
        let mut clients = self.clients.lock().expect("client registry lock poisoned");
        clients.retain(|_, client| client.last_seen.elapsed() <= idle_after);
    }

    #[cfg(test)]
    fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

/// Middleware enforcing the per-client limit.
///
/// Runs before authentication so excess load is shed without spending cycles
/// on credential verification. A client address that cannot be determined is
/// a server fault, not a rate-limit rejection.
pub async fn rate_limit(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.limiter.enabled() {
        let ip = client_ip(&req)?;

        if !state.limiter.allow(ip) {
            return Err(AppError::rate_limit_exceeded());
        }
    }

    Ok(next.run(req).await)
}

/// Resolves the client address used as the bucket key, preferring the
/// `X-Forwarded-For` header set by the reverse proxy and falling back to the
/// peer address of the connection.
fn client_ip(req: &Request) -> Result<IpAddr, AppError> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        return forwarded
            .to_str()
            .ok()
            .and_then(|value| value.split(',').next())
            .and_then(|ip| ip.trim().parse().ok())
            .ok_or_else(|| {
                AppError::server_error(anyhow::anyhow!("malformed X-Forwarded-For header"))
            });
    }

    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Ok(addr.ip());
    }

    Err(AppError::server_error(anyhow::anyhow!(
        "unable to determine client address"
    )))
}

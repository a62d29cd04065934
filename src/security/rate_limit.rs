//! Per-caller rate limiting middleware.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::error::DispatchError;
use crate::http::response::error_response;
use crate::http::AppState;
use crate::observability::metrics;

/// Callers tracked before idle ones are swept out.
pub const DEFAULT_MAX_TRACKED: usize = 10_000;

/// Requests a caller has spent that have not yet refilled.
#[derive(Debug, Clone, Copy)]
struct Allowance {
    spent: f64,
    updated: Instant,
}

impl Allowance {
    fn refilled_by(&self, now: Instant, rate: f64) -> f64 {
        now.saturating_duration_since(self.updated).as_secs_f64() * rate
    }

    /// Fully refilled, so the same as a caller never seen.
    fn is_idle(&self, now: Instant, rate: f64) -> bool {
        self.spent <= self.refilled_by(now, rate)
    }

    fn try_spend(&mut self, now: Instant, rate: f64, capacity: f64) -> bool {
        self.spent = (self.spent - self.refilled_by(now, rate)).max(0.0);
        self.updated = now;
        if self.spent + 1.0 <= capacity {
            self.spent += 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-caller allowances.
///
/// Limits are passed per call so a config reload applies immediately.
/// Once `max_tracked` callers are held, a new caller first sweeps out the
/// idle ones; busy callers are never dropped.
pub struct RateLimiter {
    callers: DashMap<String, Allowance>,
    max_tracked: usize,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::with_max_tracked(DEFAULT_MAX_TRACKED)
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tracked(max_tracked: usize) -> Self {
        Self {
            callers: DashMap::new(),
            max_tracked,
        }
    }

    /// Spend one request for `key`. False when the caller is over the limit.
    pub fn check(&self, key: &str, requests_per_second: u32, burst: u32) -> bool {
        self.check_at(key, requests_per_second, burst, Instant::now())
    }

    fn check_at(&self, key: &str, requests_per_second: u32, burst: u32, now: Instant) -> bool {
        let rate = f64::from(requests_per_second);
        let capacity = f64::from(burst.max(1));

        if self.callers.len() >= self.max_tracked && !self.callers.contains_key(key) {
            self.evict_idle(now, rate);
        }

        self.callers
            .entry(key.to_string())
            .or_insert(Allowance {
                spent: 0.0,
                updated: now,
            })
            .try_spend(now, rate, capacity)
    }

    fn evict_idle(&self, now: Instant, rate: f64) {
        let before = self.callers.len();
        self.callers.retain(|_, allowance| !allowance.is_idle(now, rate));
        tracing::debug!(
            evicted = before.saturating_sub(self.callers.len()),
            remaining = self.callers.len(),
            "Swept idle rate limit callers"
        );
    }

    /// Number of callers currently tracked.
    pub fn tracked(&self) -> usize {
        self.callers.len()
    }
}

/// Logged-in users are limited by id, everyone else by client address.
fn caller_key(state: &AppState, request: &Request<Body>) -> String {
    let user = state.authenticator.authenticate(request.headers());
    if let Some(id) = user.id {
        return format!("user:{id}");
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "anonymous".to_string(),
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let limits = state.config.load().rate_limit.clone();
    if !limits.enabled {
        return next.run(request).await;
    }

    let key = caller_key(&state, &request);
    if state
        .limiter
        .check(&key, limits.requests_per_second, limits.burst_size)
    {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, path = %request.uri().path(), "Rate limit exceeded");
        metrics::record_rate_limited("rps_limit");
        error_response(&DispatchError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("ip:1.2.3.4", 1, 2));
        assert!(limiter.check("ip:1.2.3.4", 1, 2));
        assert!(!limiter.check("ip:1.2.3.4", 1, 2));
    }

    #[test]
    fn test_callers_are_independent() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("user:1", 1, 1));
        assert!(!limiter.check("user:1", 1, 1));
        assert!(limiter.check("user:2", 1, 1));
        assert_eq!(limiter.tracked(), 2);
    }

    #[test]
    fn test_idle_callers_are_swept_when_full() {
        let limiter = RateLimiter::with_max_tracked(2);
        let start = Instant::now();
        let later = start + std::time::Duration::from_secs(1);

        assert!(limiter.check_at("ip:a", 10, 1, start));
        assert!(limiter.check_at("ip:b", 10, 1, later));
        assert_eq!(limiter.tracked(), 2);

        // ip:a has refilled; ip:b spent its request this instant
        assert!(limiter.check_at("ip:c", 10, 1, later));
        assert_eq!(limiter.tracked(), 2);
        assert!(!limiter.check_at("ip:b", 10, 1, later));
    }

    #[test]
    fn test_busy_callers_survive_a_sweep() {
        let limiter = RateLimiter::with_max_tracked(1);
        let now = Instant::now();
        assert!(limiter.check_at("user:1", 1, 1, now));
        assert!(limiter.check_at("user:2", 1, 1, now));
        assert_eq!(limiter.tracked(), 2);
        assert!(!limiter.check_at("user:1", 1, 1, now));
    }
}

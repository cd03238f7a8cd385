//! Rate limiting middleware.
//!
//! Public routes are limited per client IP, which keeps invitation codes from
//! being guessed by brute force. `X-Forwarded-For` is only honoured when the
//! service is configured to sit behind a trusted proxy.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DefaultKeyedStateStore,
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::app::AppState;

/// Checks between two sweeps of idle client entries.
const SWEEP_INTERVAL: u64 = 1024;

type KeyedLimiter<C> =
    GovRateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, C, NoOpMiddleware<<C as Clock>::Instant>>;

/// Rate limiter state shared across all requests, keyed by client IP.
pub struct RateLimiterState<C: Clock = DefaultClock> {
    limiter: KeyedLimiter<C>,
    checks: AtomicU64,
    rate_limit_per_minute: NonZeroU32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: NonZeroU32) -> Self {
        Self::with_clock(rate_limit_per_minute, DefaultClock::default())
    }

    /// Builds the limiter from configuration; `0` disables limiting.
    pub fn from_config(rate_limit_per_minute: u32) -> Option<Self> {
        NonZeroU32::new(rate_limit_per_minute).map(Self::new)
    }
}

impl<C: Clock> RateLimiterState<C> {
    pub fn with_clock(rate_limit_per_minute: NonZeroU32, clock: C) -> Self {
        Self {
            limiter: GovRateLimiter::dashmap_with_clock(
                Quota::per_minute(rate_limit_per_minute),
                clock,
            ),
            checks: AtomicU64::new(0),
            rate_limit_per_minute,
        }
    }

    pub fn limit(&self) -> u32 {
        self.rate_limit_per_minute.get()
    }

    /// Check if a request from the given client should be allowed.
    /// Returns Ok(()) if allowed, or Err with retry_after seconds if rate limited.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep();
        }

        self.limiter.check_key(&client).map_err(|not_until| {
            not_until.wait_time_from(self.limiter.clock().now()).as_secs().max(1)
        })
    }

    /// Drops clients whose quota has fully refilled.
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl<C: Clock> std::fmt::Debug for RateLimiterState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.tracked_clients())
            .finish()
    }
}

/// Client address: the socket peer, or the first `X-Forwarded-For` hop when
/// the peer is a trusted proxy.
pub fn client_ip(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse().ok())
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

/// Middleware that applies rate limiting per client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let client = client_ip(
        req.headers(),
        peer,
        state.config.security.trust_forwarded_for,
    );

    if let Err(retry_after) = rate_limiter.check(client) {
        tracing::warn!(client = %client, "Rate limit exceeded");
        return rate_limited_response(rate_limiter.limit(), retry_after);
    }

    next.run(req).await
}

fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

//! Rate limiting and other middleware.

use crate::error::AccountError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Instant};
use tracing::{debug, info, warn};

/// Global rate limiter (not keyed by IP).
pub type GlobalLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests.
#[derive(Clone)]
pub struct RateLimitState {
    /// Global rate limiter for all requests
    pub global: Arc<GlobalLimiter>,
}

impl RateLimitState {
    /// Create a new rate limit state with the specified limits.
    pub fn new(requests_per_minute: u32) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));

        Self {
            global: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(10_000)
    }
}

/// Rate limiting middleware.
///
/// Checks the global rate limit and returns 429 Too Many Requests if exceeded.
pub async fn rate_limit_middleware(
    State(rate_limit): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Result<Response, AccountError> {
    if rate_limit.global.check().is_err() {
        warn!(uri = %request.uri(), "Global rate limit exceeded");
        return Err(AccountError::RateLimitExceeded);
    }

    debug!("Rate limit check passed");
    Ok(next.run(request).await)
}

/// Log each request with its status and latency.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        warn!(%method, %path, %status, elapsed_ms, "Request failed");
    } else if status.is_client_error() {
        info!(%method, %path, %status, elapsed_ms, "Request rejected");
    } else {
        debug!(%method, %path, %status, elapsed_ms, "Request completed");
    }

    response
}

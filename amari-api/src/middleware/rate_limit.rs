/// Per-IP rate limiting for abuse-prone endpoints
///
/// Limits are enforced with the in-process sliding-window limiter from
/// `amari_shared::ratelimit`, keyed by client IP.
///
/// # Limits
///
/// | limiter          | window  | max |
/// |------------------|---------|-----|
/// | `login`          | 15 min  | 10  |
/// | `register`       | 60 min  | 5   |
/// | `password-reset` | 15 min  | 5   |
/// | `concierge`      | 1 min   | 20  |
///
/// Auth handlers call [`enforce`] directly so they can reset counters on
/// success. The concierge route uses [`concierge_rate_limit`], which also
/// reports the quota in response headers:
///
/// - `X-RateLimit-Limit`: requests allowed per window
/// - `X-RateLimit-Remaining`: requests left in the current window
/// - `Retry-After`: seconds to wait (429 responses only)

use crate::app::AppState;
use crate::error::ApiError;
use amari_shared::ratelimit::{client_ip, RateLimitOptions, RateLimiter, RateLimiterRegistry};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// The limiters used by the API
#[derive(Debug, Clone)]
pub struct ApiLimiters {
    pub login: RateLimiter,
    pub register: RateLimiter,
    pub password_reset: RateLimiter,
    pub concierge: RateLimiter,
}

impl ApiLimiters {
    pub fn new(registry: &RateLimiterRegistry) -> Self {
        Self {
            login: registry.limiter(
                "login",
                RateLimitOptions::new(Duration::from_secs(15 * 60), 10),
            ),
            register: registry.limiter(
                "register",
                RateLimitOptions::new(Duration::from_secs(60 * 60), 5),
            ),
            password_reset: registry.limiter(
                "password-reset",
                RateLimitOptions::new(Duration::from_secs(15 * 60), 5),
            ),
            concierge: registry.limiter(
                "concierge",
                RateLimitOptions::new(Duration::from_secs(60), 20),
            ),
        }
    }
}

/// Whole seconds until `limiter` admits `key` again, rounded up
pub fn retry_after_secs(limiter: &RateLimiter, key: &str) -> u64 {
    let wait = limiter.retry_after(key);
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

/// Counts an attempt for `key` and fails once the limit is exceeded
///
/// # Errors
///
/// Returns `ApiError::RateLimitExceeded` with the `Retry-After` delay
pub fn enforce(limiter: &RateLimiter, key: &str, message: &str) -> Result<(), ApiError> {
    if !limiter.is_limited(key) {
        return Ok(());
    }

    let retry_after = retry_after_secs(limiter, key);
    tracing::warn!(
        limiter = limiter.name(),
        ip = %key,
        retry_after,
        "Rate limited"
    );

    Err(ApiError::RateLimitExceeded {
        retry_after,
        message: message.to_string(),
    })
}

fn insert_quota_headers(headers: &mut HeaderMap, limiter: &RateLimiter, key: &str) {
    headers.insert(
        RATE_LIMIT_LIMIT,
        HeaderValue::from(limiter.options().max_attempts),
    );
    headers.insert(
        RATE_LIMIT_REMAINING,
        HeaderValue::from(limiter.remaining(key)),
    );
}

/// Rate limiting middleware for the concierge route
pub async fn concierge_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let limiter = &state.limiters.concierge;
    let ip = client_ip(request.headers());

    let mut response = match enforce(
        limiter,
        &ip,
        "Too many concierge requests. Please wait a moment and try again.",
    ) {
        Ok(()) => next.run(request).await,
        Err(err) => err.into_response(),
    };

    insert_quota_headers(response.headers_mut(), limiter, &ip);
    response
}

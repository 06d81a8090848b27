/// In-process sliding-window rate limiting
///
/// Each limiter namespace keeps a map of `key → (count, window reset time)`.
/// A request is admitted while the key's count in the current window stays at
/// or below `max_attempts`. Windows are fixed-size and start at the first
/// request seen for the key after the previous window ended.
///
/// Counters live in process memory: restarting the server or running several
/// instances gives each process its own view.
///
/// # Stale Entries
///
/// Expired entries are treated as absent on read, and physically removed by a
/// sweep that runs at most once per cooldown across the whole registry. The
/// sweep is triggered lazily from [`RateLimiter::is_limited`].
///
/// # Example
///
/// ```
/// use amari_shared::ratelimit::{RateLimitOptions, RateLimiterRegistry};
/// use std::time::Duration;
///
/// let registry = RateLimiterRegistry::new();
/// let login = registry.limiter(
///     "login",
///     RateLimitOptions::new(Duration::from_secs(15 * 60), 10),
/// );
///
/// assert!(!login.is_limited("203.0.113.7"));
/// assert_eq!(login.remaining("203.0.113.7"), 9);
/// ```

use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default interval between stale-entry sweeps
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Fallback key when the client address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Window size and threshold for one limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitOptions {
    /// Length of a counting window
    pub window: Duration,

    /// Requests admitted per key and window
    pub max_attempts: u32,
}

impl RateLimitOptions {
    pub fn new(window: Duration, max_attempts: u32) -> Self {
        Self {
            window,
            max_attempts,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    count: u32,
    reset_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_at
    }
}

type Store = Arc<Mutex<HashMap<String, Entry>>>;

#[derive(Debug)]
struct RegistryInner {
    stores: Mutex<HashMap<String, Store>>,
    last_cleanup: Mutex<Instant>,
    cleanup_interval: Duration,
}

/// Owner of every limiter namespace
///
/// Cloning is cheap; clones share the same namespaces.
#[derive(Debug, Clone)]
pub struct RateLimiterRegistry {
    inner: Arc<RegistryInner>,
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterRegistry {
    /// Creates an empty registry with the default sweep cooldown
    pub fn new() -> Self {
        Self::with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL)
    }

    /// Creates an empty registry with a custom sweep cooldown
    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                stores: Mutex::new(HashMap::new()),
                last_cleanup: Mutex::new(Instant::now()),
                cleanup_interval,
            }),
        }
    }

    /// Returns a limiter bound to namespace `name`
    ///
    /// The namespace is created on first use. Requesting the same name again
    /// shares the existing counters; the options of the returned handle
    /// govern how those counters are interpreted.
    pub fn limiter(&self, name: &str, options: RateLimitOptions) -> RateLimiter {
        let store = {
            let mut stores = lock(&self.inner.stores);
            stores
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(HashMap::new())))
                .clone()
        };

        RateLimiter {
            name: Arc::from(name),
            options,
            store,
            registry: self.clone(),
        }
    }

    /// Number of live namespaces
    pub fn namespace_count(&self) -> usize {
        lock(&self.inner.stores).len()
    }

    /// Drops expired entries from every namespace if the cooldown has elapsed
    ///
    /// Returns the number of removed entries, or `None` when the cooldown
    /// had not elapsed yet.
    fn cleanup_stale(&self, now: Instant) -> Option<usize> {
        {
            let mut last = lock(&self.inner.last_cleanup);
            if now.saturating_duration_since(*last) < self.inner.cleanup_interval {
                return None;
            }
            *last = now;
        }

        let stores: Vec<Store> = lock(&self.inner.stores).values().cloned().collect();
        let mut removed = 0;
        for store in stores {
            let mut entries = lock(&store);
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(now));
            removed += before - entries.len();
        }

        debug!(removed, "Swept stale rate limit entries");
        Some(removed)
    }
}

/// Handle on one limiter namespace
#[derive(Debug, Clone)]
pub struct RateLimiter {
    name: Arc<str>,
    options: RateLimitOptions,
    store: Store,
    registry: RateLimiterRegistry,
}

impl RateLimiter {
    /// Namespace name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Options this handle was created with
    pub fn options(&self) -> RateLimitOptions {
        self.options
    }

    /// Records an attempt for `key` and reports whether it exceeds the limit
    ///
    /// Every call counts, including calls that end up rejected.
    pub fn is_limited(&self, key: &str) -> bool {
        self.is_limited_at(key, Instant::now())
    }

    /// Attempts left for `key` in its current window
    pub fn remaining(&self, key: &str) -> u32 {
        self.remaining_at(key, Instant::now())
    }

    /// Forgets `key`, starting it over with a fresh window
    pub fn reset(&self, key: &str) {
        lock(&self.store).remove(key);
    }

    /// Time until the current window of `key` ends
    pub fn retry_after(&self, key: &str) -> Duration {
        self.retry_after_at(key, Instant::now())
    }

    fn is_limited_at(&self, key: &str, now: Instant) -> bool {
        self.registry.cleanup_stale(now);

        let mut entries = lock(&self.store);
        match entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.count = entry.count.saturating_add(1);
                entry.count > self.options.max_attempts
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        reset_at: now + self.options.window,
                    },
                );
                false
            }
        }
    }

    fn remaining_at(&self, key: &str, now: Instant) -> u32 {
        match lock(&self.store).get(key) {
            Some(entry) if !entry.is_expired(now) => {
                self.options.max_attempts.saturating_sub(entry.count)
            }
            _ => self.options.max_attempts,
        }
    }

    fn retry_after_at(&self, key: &str, now: Instant) -> Duration {
        match lock(&self.store).get(key) {
            Some(entry) if !entry.is_expired(now) => entry.reset_at.saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        lock(&self.store).len()
    }
}

/// Extracts the client address from proxy headers
///
/// Uses the first element of `X-Forwarded-For`. Returns `"unknown"` when
/// the header is absent, unreadable, or empty.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}

// Counters stay usable even if a holder panicked mid-update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn minute(max_attempts: u32) -> RateLimitOptions {
        RateLimitOptions::new(Duration::from_secs(60), max_attempts)
    }

    #[test]
    fn test_allows_requests_under_the_limit() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-allow", minute(3));

        assert!(!limiter.is_limited("ip1"));
        assert!(!limiter.is_limited("ip1"));
        assert!(!limiter.is_limited("ip1"));
    }

    #[test]
    fn test_blocks_requests_over_the_limit() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-block", minute(2));

        limiter.is_limited("ip2");
        limiter.is_limited("ip2");
        assert!(limiter.is_limited("ip2"));
        assert!(limiter.is_limited("ip2"));
    }

    #[test]
    fn test_tracks_keys_independently() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-keys", minute(1));

        limiter.is_limited("ip-a");
        assert!(limiter.is_limited("ip-a"));
        assert!(!limiter.is_limited("ip-b"));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let registry = RateLimiterRegistry::new();
        let login = registry.limiter("login", minute(1));
        let register = registry.limiter("register", minute(1));

        login.is_limited("ip");
        assert!(login.is_limited("ip"));
        assert!(!register.is_limited("ip"));
        assert_eq!(registry.namespace_count(), 2);
    }

    #[test]
    fn test_same_name_shares_counters() {
        let registry = RateLimiterRegistry::new();
        let first = registry.limiter("shared", minute(2));
        let second = registry.limiter("shared", minute(2));

        first.is_limited("ip");
        first.is_limited("ip");
        assert!(second.is_limited("ip"));
        assert_eq!(registry.namespace_count(), 1);
    }

    #[test]
    fn test_reports_remaining_attempts() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-remaining", minute(5));

        assert_eq!(limiter.remaining("ip3"), 5);
        limiter.is_limited("ip3");
        assert_eq!(limiter.remaining("ip3"), 4);
    }

    #[test]
    fn test_remaining_never_underflows() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-underflow", minute(1));

        for _ in 0..5 {
            limiter.is_limited("ip");
        }
        assert_eq!(limiter.remaining("ip"), 0);
    }

    #[test]
    fn test_can_reset_a_key() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-reset", minute(1));

        limiter.is_limited("ip4");
        assert!(limiter.is_limited("ip4"));
        limiter.reset("ip4");
        assert!(!limiter.is_limited("ip4"));
    }

    #[test]
    fn test_window_expiry_starts_a_new_window() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-expiry", minute(1));
        let start = Instant::now();

        assert!(!limiter.is_limited_at("ip", start));
        assert!(limiter.is_limited_at("ip", start + Duration::from_secs(30)));

        // Exactly at reset time the window is still live
        assert!(limiter.is_limited_at("ip", start + Duration::from_secs(60)));

        let later = start + Duration::from_secs(61);
        assert!(!limiter.is_limited_at("ip", later));
        assert_eq!(limiter.remaining_at("ip", later), 0);
    }

    #[test]
    fn test_remaining_resets_after_window() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-remaining-expiry", minute(3));
        let start = Instant::now();

        limiter.is_limited_at("ip", start);
        assert_eq!(limiter.remaining_at("ip", start), 2);
        assert_eq!(
            limiter.remaining_at("ip", start + Duration::from_secs(120)),
            3
        );
    }

    #[test]
    fn test_retry_after() {
        let registry = RateLimiterRegistry::new();
        let limiter = registry.limiter("test-retry", minute(1));
        let start = Instant::now();

        assert_eq!(limiter.retry_after_at("ip", start), Duration::ZERO);
        limiter.is_limited_at("ip", start);
        assert_eq!(
            limiter.retry_after_at("ip", start + Duration::from_secs(20)),
            Duration::from_secs(40)
        );
        assert_eq!(
            limiter.retry_after_at("ip", start + Duration::from_secs(90)),
            Duration::ZERO
        );
    }

    #[test]
    fn test_sweep_is_gated_by_cooldown() {
        let registry = RateLimiterRegistry::with_cleanup_interval(Duration::from_secs(300));
        let limiter = registry.limiter("test-sweep", minute(5));
        let start = Instant::now();

        limiter.is_limited_at("stale", start);
        assert_eq!(limiter.tracked_keys(), 1);

        // Window over but cooldown not elapsed: entry is kept
        limiter.is_limited_at("fresh", start + Duration::from_secs(120));
        assert_eq!(limiter.tracked_keys(), 2);

        // Cooldown elapsed: both old windows are gone, the new key is recorded
        limiter.is_limited_at("newest", start + Duration::from_secs(400));
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.remaining_at("newest", start + Duration::from_secs(400)), 4);
    }

    #[test]
    fn test_sweep_covers_every_namespace() {
        let registry = RateLimiterRegistry::with_cleanup_interval(Duration::from_secs(300));
        let a = registry.limiter("a", minute(5));
        let b = registry.limiter("b", minute(5));
        let start = Instant::now();

        a.is_limited_at("ip", start);
        b.is_limited_at("ip", start);

        assert_eq!(registry.cleanup_stale(start + Duration::from_secs(10)), None);
        assert_eq!(registry.cleanup_stale(start + Duration::from_secs(301)), Some(2));
        assert_eq!(a.tracked_keys(), 0);
        assert_eq!(b.tracked_keys(), 0);
    }

    #[test]
    fn test_client_ip_from_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        assert_eq!(client_ip(&headers), "1.2.3.4");
    }

    #[test]
    fn test_client_ip_unknown_without_header() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        assert_eq!(client_ip(&headers), "unknown");
    }
}

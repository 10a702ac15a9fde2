//! Per-client fixed-window rate limiting
//!
//! A window opens on a client's first request and lasts `window`. Up to
//! `max_requests` are allowed inside it; later requests are denied until the
//! window has elapsed, at which point the next request opens a fresh one.
//!
//! Storage sits behind [`RateLimitStore`] so a single instance can keep
//! windows in memory while a horizontally scaled deployment shares them
//! through Redis.

use crate::cache::{keys, Cache};
use crate::config::{ContactLimitConfig, LimiterBackend};
use crate::errors::Result;
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Identifier used when a request carries no usable address
pub const UNKNOWN_CLIENT: &str = "unknown";

/// In-memory windows are swept once the map grows past this many entries
const PRUNE_THRESHOLD: usize = 10_000;

/// Outcome of one rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Time until the client's window resets
    pub retry_after: Duration,
}

impl RateDecision {
    /// Whole seconds for a `Retry-After` header, never zero
    pub fn retry_after_secs(&self) -> u64 {
        self.retry_after.as_millis().div_ceil(1000).max(1) as u64
    }
}

/// Backing store for per-client windows
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Record a request from `client` and decide whether it may proceed.
    ///
    /// Check and increment happen atomically per client.
    async fn check(&self, client: &str) -> Result<RateDecision>;

    fn backend(&self) -> &'static str;
}

/// Build the configured store
pub fn build_store(
    config: &ContactLimitConfig,
    cache: Option<Arc<Cache>>,
) -> Arc<dyn RateLimitStore> {
    let window = Duration::from_millis(config.window_ms);
    match (config.backend, cache) {
        (LimiterBackend::Redis, Some(cache)) => {
            Arc::new(RedisRateLimitStore::new(cache, "contact", config.max_requests, window))
        }
        _ => Arc::new(MemoryRateLimitStore::new(config.max_requests, window)),
    }
}

// ============================================================================
// Client identity
// ============================================================================

/// Resolve the identifier a request is rate limited under.
///
/// With `trust_forwarded` the first `X-Forwarded-For` hop wins, then
/// `X-Real-IP`. Otherwise, or when neither header holds a value, the TCP
/// peer address is used.
pub fn client_identity(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded: bool,
) -> String {
    if trust_forwarded {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

// ============================================================================
// Memory store
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

/// Process-local windows guarded by a mutex
pub struct MemoryRateLimitStore {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, Window>>,
}

impl MemoryRateLimitStore {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Decide at an explicit instant
    pub fn check_at(&self, client: &str, now: Instant) -> RateDecision {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if entries.len() > PRUNE_THRESHOLD {
            let window = self.window;
            entries.retain(|_, w| now.saturating_duration_since(w.started) <= window);
        }

        let entry = entries.entry(client.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.saturating_duration_since(entry.started) > self.window {
            *entry = Window { count: 0, started: now };
        }

        let retry_after = self
            .window
            .saturating_sub(now.saturating_duration_since(entry.started));

        if entry.count >= self.max_requests {
            return RateDecision { allowed: false, retry_after };
        }

        entry.count += 1;
        RateDecision { allowed: true, retry_after }
    }

    /// Number of tracked clients
    pub fn tracked(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn check(&self, client: &str) -> Result<RateDecision> {
        Ok(self.check_at(client, Instant::now()))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// ============================================================================
// Redis store
// ============================================================================

/// Windows shared across instances through Redis counters
pub struct RedisRateLimitStore {
    cache: Arc<Cache>,
    scope: &'static str,
    max_requests: u32,
    window: Duration,
}

impl RedisRateLimitStore {
    pub fn new(cache: Arc<Cache>, scope: &'static str, max_requests: u32, window: Duration) -> Self {
        Self { cache, scope, max_requests, window }
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn check(&self, client: &str) -> Result<RateDecision> {
        let key = keys::rate_limit(self.scope, client);
        let counted = self.cache.incr_window(&key, self.window).await?;
        let allowed = counted.count <= u64::from(self.max_requests);

        debug!(scope = self.scope, count = counted.count, allowed, "Rate limit checked");

        Ok(RateDecision {
            allowed,
            retry_after: counted.resets_in,
        })
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

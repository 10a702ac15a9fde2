//! Redis integration
//!
//! Provides:
//! - Connection management
//! - Windowed counters backing the shared rate limiter

use crate::config::RedisConfig;
use crate::errors::{AppError, Result};
use redis::{aio::MultiplexedConnection, Client};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Redis client
pub struct Cache {
    connection: RwLock<MultiplexedConnection>,
    key_prefix: String,
}

/// State of a counter after an increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    /// Hits recorded in the current window, including this one
    pub count: u64,
    /// Time until the window resets
    pub resets_in: Duration,
}

impl Cache {
    /// Create a new client
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to create Redis client: {}", e),
            })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        Ok(Self {
            connection: RwLock::new(connection),
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Build a prefixed key
    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    /// Increment a counter whose window starts at its first hit.
    ///
    /// `INCR` and `PEXPIRE .. NX` run in one MULTI block so the expiry is
    /// only ever set by the hit that created the key.
    pub async fn incr_window(&self, key: &str, window: Duration) -> Result<WindowCount> {
        let full_key = self.key(key);
        let window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        let mut conn = self.connection.write().await;

        let (count, pttl): (u64, i64) = redis::pipe()
            .atomic()
            .incr(&full_key, 1u64)
            .cmd("PEXPIRE").arg(&full_key).arg(window_ms).arg("NX").ignore()
            .cmd("PTTL").arg(&full_key)
            .query_async(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Failed to increment '{}': {}", full_key, e),
            })?;

        // PTTL is negative when the key has no expiry or vanished meanwhile
        let resets_in = if pttl > 0 {
            Duration::from_millis(pttl as u64)
        } else {
            window
        };

        debug!(key = %full_key, count, resets_in_ms = resets_in.as_millis() as u64, "Counter incremented");
        Ok(WindowCount { count, resets_in })
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.write().await;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| AppError::CacheError {
                message: format!("Redis ping failed: {}", e),
            })?;
        Ok(())
    }
}

/// Key builder helpers
pub mod keys {
    use sha2::{Digest, Sha256};

    /// Rate limit counter for a client within a scope.
    ///
    /// Client identifiers are hashed so raw addresses never land in Redis.
    pub fn rate_limit(scope: &str, client: &str) -> String {
        let digest = Sha256::digest(client.as_bytes());
        format!("ratelimit:{}:{}", scope, hex::encode(&digest[..16]))
    }
}

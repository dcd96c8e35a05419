//! Redis key-value backend
//!
//! Uses `redis::aio::ConnectionManager` for async multiplexed connections.
//! Requires the `redis` feature flag.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::distributed::KeyValueBackend;
use crate::error::{CacheError, CacheResult};

/// Redis-backed [`KeyValueBackend`] with automatic reconnection.
#[derive(Clone)]
pub struct RedisBackend {
    connection_manager: redis::aio::ConnectionManager,
}

impl fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisBackend")
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisBackend {
    /// Connects to the Redis server at `url`.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            CacheError::Connection(format!("Failed to create Redis client: {}", e))
        })?;

        let connection_manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        debug!(url = %redact_url(url), "Redis cache backend connected");

        Ok(Self { connection_manager })
    }
}

#[async_trait]
impl KeyValueBackend for RedisBackend {
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection_manager.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis GET failed: {}", e)))
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl.as_secs().max(1);

        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis SETEX failed: {}", e)))
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();

        redis::cmd("DEL")
            .arg(key)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| CacheError::Backend(format!("Redis DEL failed: {}", e)))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Redact the password from a Redis URL for logging.
fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            return format!("{}***{}", &url[..=colon_pos], &url[at_pos..]);
        }
    }
    url.to_string()
}

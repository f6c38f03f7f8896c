//! Redis-backed cache store.
//!
//! Probed once at construction. If the probe fails the store stays disabled
//! for the life of the process; there is no reconnect loop.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::time::Duration;
use stratus_core::CacheError;

use crate::cache::CacheStore;

pub struct RedisCache {
    /// `None` means disabled.
    conn: Option<MultiplexedConnection>,
}

impl RedisCache {
    /// Connect and PING. Never fails: an unreachable store yields a disabled cache.
    pub async fn connect(url: &str, probe_timeout: Duration) -> Self {
        match Self::probe(url, probe_timeout).await {
            Ok(conn) => {
                tracing::info!("Connected to Redis cache");
                Self { conn: Some(conn) }
            }
            Err(e) => {
                tracing::warn!("Redis connection failed: {}. Running without cache.", e);
                Self::disabled()
            }
        }
    }

    /// A store that reports every lookup as a miss and drops every write.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    async fn probe(url: &str, probe_timeout: Duration) -> Result<MultiplexedConnection, CacheError> {
        let client =
            redis::Client::open(url).map_err(|e| CacheError::Connection(e.to_string()))?;

        let attempt = async {
            let mut conn = client.get_multiplexed_async_connection().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, redis::RedisError>((conn, pong))
        };

        let (conn, pong) = tokio::time::timeout(probe_timeout, attempt)
            .await
            .map_err(|_| {
                CacheError::Connection(format!("probe timed out after {:?}", probe_timeout))
            })?
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        tracing::debug!("Redis probe answered {}", pong);
        Ok(conn)
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.conn.clone()?;
        let result: redis::RedisResult<Option<Vec<u8>>> = conn.get(key).await;
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Redis GET {} failed: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let Some(mut conn) = self.conn.clone() else {
            return Ok(());
        };

        // SETEX rejects 0
        let seconds = ttl.as_secs().max(1);
        let result: redis::RedisResult<()> = conn.set_ex(key, value, seconds).await;
        result.map_err(|e| CacheError::Command(e.to_string()))
    }
}

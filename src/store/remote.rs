//! Redis Store Module
//!
//! [`StoreClient`] over a multiplexed async Redis connection. The connection
//! pipelines independent requests, so one handle is cloned per call and
//! shared freely between tasks.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{effective_ttl, StoreClient};

// == Redis Store ==
#[derive(Clone)]
pub struct RedisStore {
    conn: MultiplexedConnection,
    url: String,
}

impl RedisStore {
    /// Connects to `url` (e.g. `redis://127.0.0.1:6379/10`).
    pub async fn connect(url: &str) -> Result<Self> {
        let client = Client::open(url)
            .map_err(|e| CacheError::StoreUnavailable(format!("invalid Redis URL: {}", e)))?;
        let conn = client.get_multiplexed_async_connection().await?;

        info!(url = %url, "Connected to Redis");
        Ok(Self {
            conn,
            url: url.to_string(),
        })
    }

    /// Connects using the configured host, port and database, giving up
    /// after the configured timeout.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let url = config.store_url();
        tokio::time::timeout(config.timeout(), Self::connect(&url))
            .await
            .map_err(|_| {
                CacheError::StoreUnavailable(format!(
                    "connecting to {} timed out after {}ms",
                    url, config.timeout_ms
                ))
            })?
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<u64>) -> Result<()> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(secs) = effective_ttl(ttl) {
            cmd.arg("EX").arg(checked_ttl(secs)?);
        }
        let _: () = cmd.query_async(&mut conn).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn expire(&self, key: &str, ttl: u64) -> Result<bool> {
        let mut conn = self.conn.clone();
        let applied: bool = redis::cmd("EXPIRE")
            .arg(key)
            .arg(checked_ttl(ttl)?)
            .query_async(&mut conn)
            .await?;
        Ok(applied)
    }

    async fn flush_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

/// Largest TTL Redis accepts: the server converts seconds to milliseconds in
/// a signed 64-bit integer.
const MAX_TTL_SECS: u64 = (i64::MAX / 1000) as u64;

fn checked_ttl(ttl: u64) -> Result<u64> {
    if ttl > MAX_TTL_SECS {
        return Err(CacheError::InvalidArgument(format!(
            "TTL of {}s exceeds the Redis maximum of {}s",
            ttl, MAX_TTL_SECS
        )));
    }
    Ok(ttl)
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").field("url", &self.url).finish()
    }
}

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

use super::{HealthCheck, SessionKey, SessionStore};
use crate::metrics::{record_cache_hit, record_cache_miss, track_cache_operation};

/// Session store on Redis. Each entry is written with `SETEX` so abandoned attempts expire.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let key = key.to_string();

        let value: Option<String> = track_cache_operation("get", async {
            redis::cmd("GET")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .with_context(|| format!("Failed to read {} from Redis", key))
        })
        .await?;

        if value.is_some() {
            record_cache_hit();
        } else {
            record_cache_miss();
        }
        Ok(value)
    }

    async fn set(&self, key: &SessionKey, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = key.to_string();
        let ttl_seconds = ttl.as_secs().max(1);

        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&key)
                .arg(ttl_seconds)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .with_context(|| format!("Failed to save {} to Redis", key))
        })
        .await
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        let mut conn = self.redis.clone();
        let key = key.to_string();

        track_cache_operation("del", async {
            redis::cmd("DEL")
                .arg(&key)
                .query_async::<()>(&mut conn)
                .await
                .with_context(|| format!("Failed to delete {} from Redis", key))
        })
        .await
    }
}

#[async_trait]
impl HealthCheck for RedisSessionStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .context("Redis PING failed")?;
        Ok(())
    }
}

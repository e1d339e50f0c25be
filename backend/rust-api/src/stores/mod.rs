//! Storage collaborators used by the quiz services.
//!
//! Every adapter returns `anyhow::Result`; the services wrap failures into
//! [`crate::error::QuizError::Storage`].

use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{AttemptHistoryRecord, ProgressRecord, Topic};

pub mod memory;
pub mod mongo;
pub mod redis_session;

pub use self::memory::{
    MemoryAttemptHistory, MemoryContentRepository, MemoryProgressStore, MemorySessionStore,
};
pub use self::mongo::MongoStore;
pub use self::redis_session::RedisSessionStore;

/// Read-only topic catalog.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn list_topics(&self) -> Result<Vec<Topic>>;

    async fn get_topic(&self, topic_id: i64) -> Result<Option<Topic>>;
}

/// Append-only attempt history. Reads return newest first.
#[async_trait]
pub trait AttemptHistoryStore: Send + Sync {
    async fn append_attempt(&self, record: AttemptHistoryRecord) -> Result<()>;

    async fn recent_attempts_for_topic(
        &self,
        user_id: &str,
        topic_id: i64,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>>;

    async fn recent_attempts(&self, user_id: &str, limit: usize)
        -> Result<Vec<AttemptHistoryRecord>>;
}

/// Transient key/value store with per-key expiry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &SessionKey) -> Result<Option<String>>;

    async fn set(&self, key: &SessionKey, value: String, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &SessionKey) -> Result<()>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(&self, user_id: &str, topic_id: i64) -> Result<Option<ProgressRecord>>;

    async fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>>;

    async fn save_progress(&self, record: ProgressRecord) -> Result<()>;
}

/// A backing service that `/health` pings.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionSlot {
    /// Snapshot of the attempt currently in flight.
    Attempt,
    /// Signatures of recently graded orders.
    Repetition,
}

impl SessionSlot {
    fn as_str(&self) -> &'static str {
        match self {
            SessionSlot::Attempt => "attempt",
            SessionSlot::Repetition => "repetition",
        }
    }
}

/// Session entries are always scoped to one (user, topic) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub user_id: String,
    pub topic_id: i64,
    pub slot: SessionSlot,
}

impl SessionKey {
    pub fn attempt(user_id: &str, topic_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            topic_id,
            slot: SessionSlot::Attempt,
        }
    }

    pub fn repetition(user_id: &str, topic_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            topic_id,
            slot: SessionSlot::Repetition,
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "quiz:{}:{}:{}",
            self.slot.as_str(),
            self.user_id,
            self.topic_id
        )
    }
}

/// Reads a JSON value. Entries that no longer parse are treated as absent.
pub async fn get_json<T: DeserializeOwned>(
    store: &dyn SessionStore,
    key: &SessionKey,
) -> Result<Option<T>> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "Discarding unreadable session entry");
            Ok(None)
        }
    }
}

pub async fn set_json<T: Serialize + Sync>(
    store: &dyn SessionStore,
    key: &SessionKey,
    value: &T,
    ttl: Duration,
) -> Result<()> {
    let raw = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize session entry {}", key))?;
    store.set(key, raw, ttl).await
}

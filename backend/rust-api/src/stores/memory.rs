use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{AttemptHistoryStore, ContentRepository, ProgressStore, SessionKey, SessionStore};
use crate::models::{AttemptHistoryRecord, ProgressRecord, Topic};

/// Topic catalog held in memory, optionally seeded from a JSON array of topics.
#[derive(Debug, Default)]
pub struct MemoryContentRepository {
    topics: RwLock<Vec<Topic>>,
}

impl MemoryContentRepository {
    pub fn new(topics: Vec<Topic>) -> Self {
        Self {
            topics: RwLock::new(topics),
        }
    }

    pub async fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read content seed {}", path.display()))?;
        let topics: Vec<Topic> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse content seed {}", path.display()))?;

        tracing::info!(
            "Loaded {} topics from content seed {}",
            topics.len(),
            path.display()
        );
        Ok(Self::new(topics))
    }
}

#[async_trait]
impl ContentRepository for MemoryContentRepository {
    async fn list_topics(&self) -> Result<Vec<Topic>> {
        Ok(self.topics.read().await.clone())
    }

    async fn get_topic(&self, topic_id: i64) -> Result<Option<Topic>> {
        Ok(self
            .topics
            .read()
            .await
            .iter()
            .find(|topic| topic.id == topic_id)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryAttemptHistory {
    records: RwLock<Vec<AttemptHistoryRecord>>,
}

impl MemoryAttemptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    async fn newest_first<F>(&self, limit: usize, filter: F) -> Vec<AttemptHistoryRecord>
    where
        F: Fn(&AttemptHistoryRecord) -> bool,
    {
        // Reverse insertion order first so equal timestamps keep newest-appended on top.
        let mut matching: Vec<AttemptHistoryRecord> = self
            .records
            .read()
            .await
            .iter()
            .rev()
            .filter(|record| filter(*record))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        matching
    }
}

#[async_trait]
impl AttemptHistoryStore for MemoryAttemptHistory {
    async fn append_attempt(&self, record: AttemptHistoryRecord) -> Result<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn recent_attempts_for_topic(
        &self,
        user_id: &str,
        topic_id: i64,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>> {
        Ok(self
            .newest_first(limit, |record| {
                record.user_id == user_id && record.topic_id == topic_id
            })
            .await)
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>> {
        Ok(self
            .newest_first(limit, |record| record.user_id == user_id)
            .await)
    }
}

/// Session store with lazy expiry: stale entries are dropped when read, and every
/// write sweeps whatever else has expired.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &SessionKey) -> Result<Option<String>> {
        let key = key.to_string();
        let mut entries = self.entries.write().await;

        match entries.get(&key) {
            Some((_, expires_at)) if *expires_at <= Instant::now() => {
                entries.remove(&key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &SessionKey, value: String, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        self.entries.write().await.remove(&key.to_string());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<(String, i64), ProgressRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn get_progress(&self, user_id: &str, topic_id: i64) -> Result<Option<ProgressRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(user_id.to_string(), topic_id))
            .cloned())
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let mut records: Vec<ProgressRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|record| record.topic_id);
        Ok(records)
    }

    async fn save_progress(&self, record: ProgressRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert((record.user_id.clone(), record.topic_id), record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::fixtures::{attempt, topic};

    #[tokio::test]
    async fn history_reads_newest_first_and_respects_limit() {
        let history = MemoryAttemptHistory::new();
        history.append_attempt(attempt(1, 50, 10, 20, 30)).await.unwrap();
        history.append_attempt(attempt(2, 60, 10, 20, 20)).await.unwrap();
        history.append_attempt(attempt(1, 70, 10, 20, 10)).await.unwrap();
        history.append_attempt(attempt(1, 80, 10, 20, 0)).await.unwrap();

        let recent = history
            .recent_attempts_for_topic("learner", 1, 2)
            .await
            .unwrap();
        let scores: Vec<u32> = recent.iter().map(|record| record.score).collect();
        assert_eq!(scores, vec![80, 70]);

        let all = history.recent_attempts("learner", 10).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[2].topic_id, 2);

        assert!(history.recent_attempts("someone-else", 10).await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn session_entries_expire() {
        let store = MemorySessionStore::new();
        let key = SessionKey::attempt("u1", 1);

        store
            .set(&key, "{}".to_string(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("{}"));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn writes_sweep_expired_sessions() {
        let store = MemorySessionStore::new();
        for topic_id in 1..=3 {
            store
                .set(
                    &SessionKey::attempt("u1", topic_id),
                    "{}".to_string(),
                    Duration::from_secs(5),
                )
                .await
                .unwrap();
        }
        assert_eq!(store.entry_count().await, 3);

        tokio::time::advance(Duration::from_secs(6)).await;
        store
            .set(
                &SessionKey::repetition("u2", 9),
                "{}".to_string(),
                Duration::from_secs(60),
            )
            .await
            .unwrap();

        assert_eq!(store.entry_count().await, 1);
    }

    #[tokio::test]
    async fn session_delete_is_idempotent() {
        let store = MemorySessionStore::new();
        let key = SessionKey::attempt("u1", 1);

        store
            .set(&key, "{}".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        store.delete(&key).await.unwrap();
        store.delete(&key).await.unwrap();

        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn content_lookup_by_id() {
        let repository = MemoryContentRepository::new(vec![
            topic(1, Vec::new(), Vec::new()),
            topic(4, Vec::new(), Vec::new()),
        ]);

        assert_eq!(repository.list_topics().await.unwrap().len(), 2);
        assert_eq!(
            repository.get_topic(4).await.unwrap().map(|topic| topic.id),
            Some(4)
        );
        assert!(repository.get_topic(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn loads_sample_content_seed() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/topics.json");
        let repository = MemoryContentRepository::from_json_file(path).await.unwrap();

        let topic = repository.get_topic(1).await.unwrap().unwrap();
        assert_eq!(topic.lessons.len(), 4);
        assert_eq!(topic.lessons[0].key_points.len(), 1);
        assert_eq!(topic.curated_questions.len(), 3);
        assert_eq!(topic.curated_questions[1].correct_option_index, 2);
    }

    #[tokio::test]
    async fn missing_content_seed_is_an_error() {
        let result = MemoryContentRepository::from_json_file("does/not/exist.json").await;
        assert!(result.is_err());
    }
}

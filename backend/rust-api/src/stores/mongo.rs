use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, ReplaceOptions},
    Collection, Database,
};

use super::{AttemptHistoryStore, ContentRepository, HealthCheck, ProgressStore};
use crate::metrics::track_db_operation;
use crate::models::{AttemptHistoryRecord, ProgressRecord, Topic};

const TOPICS: &str = "topics";
const QUIZ_ATTEMPTS: &str = "quiz_attempts";
const PROGRESS: &str = "progress";

/// MongoDB-backed content, history and progress.
#[derive(Clone)]
pub struct MongoStore {
    mongo: Database,
}

impl MongoStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn topics(&self) -> Collection<Topic> {
        self.mongo.collection(TOPICS)
    }

    fn attempts(&self) -> Collection<AttemptHistoryRecord> {
        self.mongo.collection(QUIZ_ATTEMPTS)
    }

    fn progress(&self) -> Collection<ProgressRecord> {
        self.mongo.collection(PROGRESS)
    }

    async fn find_attempts(
        &self,
        filter: mongodb::bson::Document,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        track_db_operation("find", QUIZ_ATTEMPTS, async {
            let cursor = self
                .attempts()
                .find(filter)
                .with_options(options)
                .await
                .context("Failed to query quiz attempts")?;
            cursor
                .try_collect()
                .await
                .context("Quiz attempts cursor error")
        })
        .await
    }
}

#[async_trait]
impl ContentRepository for MongoStore {
    async fn list_topics(&self) -> Result<Vec<Topic>> {
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();

        track_db_operation("find", TOPICS, async {
            let cursor = self
                .topics()
                .find(doc! {})
                .with_options(options)
                .await
                .context("Failed to query topics")?;
            cursor.try_collect().await.context("Topics cursor error")
        })
        .await
    }

    async fn get_topic(&self, topic_id: i64) -> Result<Option<Topic>> {
        track_db_operation("find_one", TOPICS, async {
            self.topics()
                .find_one(doc! { "_id": topic_id })
                .await
                .with_context(|| format!("Failed to fetch topic {}", topic_id))
        })
        .await
    }
}

#[async_trait]
impl AttemptHistoryStore for MongoStore {
    async fn append_attempt(&self, record: AttemptHistoryRecord) -> Result<()> {
        track_db_operation("insert_one", QUIZ_ATTEMPTS, async {
            self.attempts()
                .insert_one(&record)
                .await
                .context("Failed to record quiz attempt")?;
            Ok(())
        })
        .await
    }

    async fn recent_attempts_for_topic(
        &self,
        user_id: &str,
        topic_id: i64,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>> {
        self.find_attempts(doc! { "user_id": user_id, "topic_id": topic_id }, limit)
            .await
    }

    async fn recent_attempts(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<AttemptHistoryRecord>> {
        self.find_attempts(doc! { "user_id": user_id }, limit).await
    }
}

#[async_trait]
impl ProgressStore for MongoStore {
    async fn get_progress(&self, user_id: &str, topic_id: i64) -> Result<Option<ProgressRecord>> {
        track_db_operation("find_one", PROGRESS, async {
            self.progress()
                .find_one(doc! { "user_id": user_id, "topic_id": topic_id })
                .await
                .context("Failed to fetch progress")
        })
        .await
    }

    async fn list_progress(&self, user_id: &str) -> Result<Vec<ProgressRecord>> {
        let options = FindOptions::builder().sort(doc! { "topic_id": 1 }).build();

        track_db_operation("find", PROGRESS, async {
            let cursor = self
                .progress()
                .find(doc! { "user_id": user_id })
                .with_options(options)
                .await
                .context("Failed to query progress")?;
            cursor.try_collect().await.context("Progress cursor error")
        })
        .await
    }

    async fn save_progress(&self, record: ProgressRecord) -> Result<()> {
        track_db_operation("replace_one", PROGRESS, async {
            self.progress()
                .replace_one(
                    doc! { "user_id": &record.user_id, "topic_id": record.topic_id },
                    &record,
                )
                .with_options(ReplaceOptions::builder().upsert(true).build())
                .await
                .context("Failed to save progress")?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl HealthCheck for MongoStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }
}

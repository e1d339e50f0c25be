use std::sync::Arc;

use anyhow::Context;
use mongodb::Client as MongoClient;
use redis::aio::ConnectionManager;

use crate::config::Config;
use crate::models::Topic;
use crate::stores::{
    AttemptHistoryStore, ContentRepository, HealthCheck, MemoryAttemptHistory,
    MemoryContentRepository, MemoryProgressStore, MemorySessionStore, MongoStore, ProgressStore,
    RedisSessionStore, SessionStore,
};

pub mod dashboard_service;
pub mod quiz_service;

pub use dashboard_service::DashboardService;
pub use quiz_service::QuizService;

/// The collaborators the quiz services are built from.
#[derive(Clone)]
pub struct Stores {
    pub content: Arc<dyn ContentRepository>,
    pub history: Arc<dyn AttemptHistoryStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub progress: Arc<dyn ProgressStore>,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl Stores {
    /// Process-local stores over a fixed catalog. Nothing survives a restart.
    pub fn in_memory(topics: Vec<Topic>) -> Self {
        Self {
            content: Arc::new(MemoryContentRepository::new(topics)),
            history: Arc::new(MemoryAttemptHistory::new()),
            sessions: Arc::new(MemorySessionStore::new()),
            progress: Arc::new(MemoryProgressStore::new()),
            health_checks: Vec::new(),
        }
    }
}

pub struct AppState {
    pub config: Config,
    pub quiz: QuizService,
    pub dashboard: DashboardService,
    pub health_checks: Vec<Arc<dyn HealthCheck>>,
}

impl AppState {
    /// MongoDB for content, history and progress; Redis for attempt sessions.
    pub async fn new(
        config: Config,
        mongo_client: MongoClient,
        redis_client: redis::Client,
    ) -> anyhow::Result<Self> {
        let mongo = MongoStore::new(mongo_client.database(&config.mongo_database));

        tracing::info!("Attempting to connect to Redis...");

        let redis = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            ConnectionManager::new(redis_client),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

        let sessions = RedisSessionStore::new(redis);
        tokio::time::timeout(std::time::Duration::from_secs(5), sessions.ping())
            .await
            .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

        tracing::info!("Redis connection established successfully");

        let mongo = Arc::new(mongo);
        let sessions = Arc::new(sessions);
        let health_checks = vec![
            mongo.clone() as Arc<dyn HealthCheck>,
            sessions.clone() as Arc<dyn HealthCheck>,
        ];
        let stores = Stores {
            content: mongo.clone(),
            history: mongo.clone(),
            sessions,
            progress: mongo,
            health_checks,
        };

        Ok(Self::from_stores(config, stores))
    }

    /// In-memory stores, with the catalog read from `content_seed_path` when set.
    pub async fn in_memory(config: Config) -> anyhow::Result<Self> {
        let topics = match &config.content_seed_path {
            Some(path) => MemoryContentRepository::from_json_file(path)
                .await?
                .list_topics()
                .await
                .context("Failed to read seeded topics")?,
            None => {
                tracing::warn!("No content seed configured; starting with an empty catalog");
                Vec::new()
            }
        };

        Ok(Self::from_stores(config, Stores::in_memory(topics)))
    }

    pub fn from_stores(config: Config, stores: Stores) -> Self {
        let quiz = QuizService::new(&stores, config.quiz.clone());
        let dashboard = DashboardService::new(&stores, config.quiz.history_limit);

        Self {
            config,
            quiz,
            dashboard,
            health_checks: stores.health_checks,
        }
    }
}

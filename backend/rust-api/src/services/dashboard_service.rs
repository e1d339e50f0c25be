use std::sync::Arc;

use crate::error::QuizError;
use crate::models::DashboardResponse;
use crate::quiz::analytics::{build_dashboard_analytics, completion_stats};
use crate::stores::{AttemptHistoryStore, ContentRepository, ProgressStore};

use super::Stores;

pub struct DashboardService {
    content: Arc<dyn ContentRepository>,
    history: Arc<dyn AttemptHistoryStore>,
    progress: Arc<dyn ProgressStore>,
    history_limit: usize,
}

impl DashboardService {
    pub fn new(stores: &Stores, history_limit: usize) -> Self {
        Self {
            content: stores.content.clone(),
            history: stores.history.clone(),
            progress: stores.progress.clone(),
            history_limit,
        }
    }

    /// Completion stats plus analytics over the learner's newest attempts.
    pub async fn dashboard(&self, user_id: &str) -> Result<DashboardResponse, QuizError> {
        let topics = self.content.list_topics().await?;
        let progress = self.progress.list_progress(user_id).await?;
        let attempts = self
            .history
            .recent_attempts(user_id, self.history_limit)
            .await?;

        tracing::debug!(
            "Building dashboard for user {} from {} attempts",
            user_id,
            attempts.len()
        );

        Ok(DashboardResponse {
            stats: completion_stats(&progress, topics.len()),
            analytics: build_dashboard_analytics(&topics, &progress, &attempts),
        })
    }
}

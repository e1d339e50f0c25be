use serde::Serialize;

use super::DifficultyTier;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopicStats {
    pub topic_id: i64,
    pub topic: String,
    pub attempts: usize,
    pub avg_score: Option<u32>,
    pub avg_seconds_per_question: Option<f64>,
    pub completed: bool,
    pub next_difficulty: DifficultyTier,
    pub next_difficulty_label: &'static str,
    pub lesson_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TopicHighlight {
    pub topic_id: i64,
    pub topic: String,
    pub avg_score: u32,
    pub avg_seconds_per_question: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedLesson {
    pub topic_id: i64,
    pub topic_title: String,
    pub lesson_id: i64,
    pub lesson_title: String,
    pub lesson_index: usize,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardAnalytics {
    pub topic_stats: Vec<TopicStats>,
    pub strengths: Vec<TopicHighlight>,
    pub weak_areas: Vec<TopicHighlight>,
    pub recommended_next_lesson: Option<RecommendedLesson>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CompletionStats {
    pub completed_count: usize,
    pub total_topics: usize,
    pub progress_percentage: u32,
    pub avg_score: u32,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub stats: CompletionStats,
    pub analytics: DashboardAnalytics,
}

use std::collections::HashMap;

use crate::models::{
    AttemptHistoryRecord, CompletionStats, DashboardAnalytics, ProgressRecord, RecommendedLesson,
    Topic, TopicHighlight, TopicStats,
};

use super::difficulty::{
    average_score, average_seconds_per_question, recommend_difficulty, FAST_SECONDS_PER_QUESTION,
};

const HIGHLIGHT_LIMIT: usize = 3;
const PACE_PENALTY_START: f64 = 30.0;
const PACE_PENALTY_PER_SECOND: f64 = 0.6;
const FUNDAMENTALS_SCORE: u32 = 60;

const WEAKEST_TOPIC_REASON: &str =
    "Focus on your weakest topic based on recent quiz accuracy and speed.";
const NEXT_TOPIC_REASON: &str = "Continue your learning path with the next available topic.";

struct RankedTopic<'a> {
    stats: &'a TopicStats,
    avg_score: u32,
    rating: f64,
}

impl RankedTopic<'_> {
    fn highlight(&self) -> TopicHighlight {
        TopicHighlight {
            topic_id: self.stats.topic_id,
            topic: self.stats.topic.clone(),
            avg_score: self.avg_score,
            avg_seconds_per_question: self.stats.avg_seconds_per_question,
        }
    }
}

/// Ranking score: accuracy, minus a penalty for every second per question beyond 30.
/// Topics without timing data are treated as fluent.
pub fn topic_rating(avg_score: u32, avg_seconds_per_question: Option<f64>) -> f64 {
    let pace = avg_seconds_per_question.unwrap_or(FAST_SECONDS_PER_QUESTION);
    f64::from(avg_score) - ((pace - PACE_PENALTY_START) * PACE_PENALTY_PER_SECOND).max(0.0)
}

/// Summarizes history (newest first) into per-topic stats, strengths, weak areas and
/// the next lesson to study.
pub fn build_dashboard_analytics(
    topics: &[Topic],
    progress: &[ProgressRecord],
    attempts: &[AttemptHistoryRecord],
) -> DashboardAnalytics {
    let mut attempts_by_topic: HashMap<i64, Vec<AttemptHistoryRecord>> = HashMap::new();
    for attempt in attempts {
        attempts_by_topic
            .entry(attempt.topic_id)
            .or_default()
            .push(attempt.clone());
    }

    let completed: HashMap<i64, bool> = progress
        .iter()
        .map(|record| (record.topic_id, record.completed))
        .collect();

    let topic_stats: Vec<TopicStats> = topics
        .iter()
        .map(|topic| {
            let history = attempts_by_topic
                .get(&topic.id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let next_difficulty = recommend_difficulty(history);

            TopicStats {
                topic_id: topic.id,
                topic: topic.title.clone(),
                attempts: history.len(),
                avg_score: average_score(history),
                avg_seconds_per_question: average_seconds_per_question(history)
                    .map(|pace| (pace * 10.0).round() / 10.0),
                completed: completed.get(&topic.id).copied().unwrap_or(false),
                next_difficulty,
                next_difficulty_label: next_difficulty.label(),
                lesson_count: topic.lessons.len(),
            }
        })
        .collect();

    let ranked: Vec<RankedTopic> = topic_stats
        .iter()
        .filter(|stats| stats.attempts > 0)
        .filter_map(|stats| {
            let avg_score = stats.avg_score?;
            Some(RankedTopic {
                stats,
                avg_score,
                rating: topic_rating(avg_score, stats.avg_seconds_per_question),
            })
        })
        .collect();

    let mut by_rating_desc: Vec<&RankedTopic> = ranked.iter().collect();
    by_rating_desc.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    let strengths: Vec<TopicHighlight> = by_rating_desc
        .iter()
        .take(HIGHLIGHT_LIMIT)
        .map(|topic| topic.highlight())
        .collect();

    let mut by_rating_asc: Vec<&RankedTopic> = ranked
        .iter()
        .filter(|topic| {
            !strengths
                .iter()
                .any(|strength| strength.topic_id == topic.stats.topic_id)
        })
        .collect();
    by_rating_asc.sort_by(|a, b| a.rating.total_cmp(&b.rating));
    let weak_areas: Vec<TopicHighlight> = by_rating_asc
        .iter()
        .take(HIGHLIGHT_LIMIT)
        .map(|topic| topic.highlight())
        .collect();

    let recommended_next_lesson = recommend_next_lesson(topics, &topic_stats, weak_areas.first());

    DashboardAnalytics {
        topic_stats,
        strengths,
        weak_areas,
        recommended_next_lesson,
    }
}

fn recommend_next_lesson(
    topics: &[Topic],
    topic_stats: &[TopicStats],
    weakest: Option<&TopicHighlight>,
) -> Option<RecommendedLesson> {
    let weak_topic = weakest.and_then(|weak| topics.iter().find(|topic| topic.id == weak.topic_id));

    let (topic, reason) = match weak_topic {
        Some(topic) => (topic, WEAKEST_TOPIC_REASON),
        None => {
            let next = topics
                .iter()
                .zip(topic_stats)
                .find(|(_, stats)| !stats.completed)
                .map(|(topic, _)| topic)
                .or_else(|| topics.first())?;
            (next, NEXT_TOPIC_REASON)
        }
    };

    if topic.lessons.is_empty() {
        return None;
    }

    let start_from_fundamentals = weakest.is_some_and(|weak| weak.avg_score < FUNDAMENTALS_SCORE);
    let lesson_index = if start_from_fundamentals {
        0
    } else {
        (topic.lessons.len() / 2).min(topic.lessons.len() - 1)
    };
    let lesson = &topic.lessons[lesson_index];

    Some(RecommendedLesson {
        topic_id: topic.id,
        topic_title: topic.title.clone(),
        lesson_id: lesson.id,
        lesson_title: lesson.title.clone(),
        lesson_index,
        reason: reason.to_string(),
    })
}

/// Completion summary across the catalog. Averages the latest score of completed topics.
pub fn completion_stats(progress: &[ProgressRecord], total_topics: usize) -> CompletionStats {
    let completed: Vec<&ProgressRecord> =
        progress.iter().filter(|record| record.completed).collect();
    let completed_count = completed.len();

    let avg_score = if completed.is_empty() {
        0
    } else {
        let total: u64 = completed
            .iter()
            .map(|record| u64::from(record.score))
            .sum();
        (total as f64 / completed_count as f64).round() as u32
    };

    let progress_percentage = if total_topics == 0 {
        0
    } else {
        (completed_count as f64 * 100.0 / total_topics as f64).round() as u32
    };

    CompletionStats {
        completed_count,
        total_topics,
        progress_percentage,
        avg_score,
    }
}

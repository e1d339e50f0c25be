use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::QuizError,
    extractors::{AppJson, UserId},
    models::{
        StartAttemptResponse, SubmitAttemptRequest, SubmitAttemptResponse, TopicLessonsResponse,
        TopicSummary,
    },
    services::AppState,
};

/// Topic ids arrive as raw path segments; anything non-numeric is simply an unknown topic.
fn parse_topic_id(raw: &str) -> Result<i64, QuizError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| QuizError::InvalidTopicId(raw.to_string()))
}

pub async fn list_topics(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
) -> Result<Json<Vec<TopicSummary>>, QuizError> {
    Ok(Json(state.quiz.list_topics(&user_id).await?))
}

pub async fn get_topic(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(topic_id): Path<String>,
) -> Result<Json<TopicLessonsResponse>, QuizError> {
    let topic_id = parse_topic_id(&topic_id)?;
    Ok(Json(state.quiz.topic_lessons(&user_id, topic_id).await?))
}

pub async fn start_attempt(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(topic_id): Path<String>,
) -> Result<Json<StartAttemptResponse>, QuizError> {
    let topic_id = parse_topic_id(&topic_id)?;
    Ok(Json(state.quiz.start_attempt(&user_id, topic_id).await?))
}

pub async fn submit_attempt(
    State(state): State<Arc<AppState>>,
    UserId(user_id): UserId,
    Path(topic_id): Path<String>,
    AppJson(payload): AppJson<SubmitAttemptRequest>,
) -> Result<Json<SubmitAttemptResponse>, QuizError> {
    let topic_id = parse_topic_id(&topic_id)?;
    let response = state
        .quiz
        .submit_attempt(&user_id, topic_id, payload.answers)
        .await?;
    Ok(Json(response))
}

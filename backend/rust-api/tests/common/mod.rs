#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use mastery_api::{
    config::{Config, QuizSettings, StorageMode},
    create_router,
    models::{AttemptHistoryRecord, DifficultyTier, Lesson, Question, Topic},
    services::{AppState, Stores},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const CURATED_TOPIC: i64 = 1;
pub const DEEP_TOPIC: i64 = 2;
pub const EMPTY_TOPIC: i64 = 3;
pub const LESSON_TOPIC: i64 = 4;

pub struct TestApp {
    pub router: Router,
    pub stores: Stores,
}

pub fn test_config() -> Config {
    Config {
        storage_mode: StorageMode::Memory,
        mongo_uri: "mongodb://localhost:27017".to_string(),
        redis_uri: "redis://127.0.0.1:6379/0".to_string(),
        mongo_database: "mastery_test".to_string(),
        content_seed_path: None,
        server_addr: "127.0.0.1:0".to_string(),
        quiz: QuizSettings {
            shuffle_seed: Some(2024),
            ..QuizSettings::default()
        },
    }
}

pub fn create_test_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let stores = Stores::in_memory(catalog());
    let app_state = Arc::new(AppState::from_stores(test_config(), stores.clone()));

    TestApp {
        router: create_router(app_state),
        stores,
    }
}

pub fn question(id: i64) -> Question {
    Question {
        id,
        prompt: format!("Question {}", id),
        options: vec![
            "first".to_string(),
            "second".to_string(),
            "third".to_string(),
            "fourth".to_string(),
        ],
        correct_option_index: (id % 4) as u32,
    }
}

fn lesson(id: i64, key_point: &str) -> Lesson {
    Lesson {
        id,
        title: format!("Lesson {}", id),
        content: format!("Content of lesson {}", id),
        key_points: vec![key_point.to_string()],
    }
}

pub fn catalog() -> Vec<Topic> {
    vec![
        Topic {
            id: CURATED_TOPIC,
            title: "Variables".to_string(),
            description: "Names and values".to_string(),
            icon: None,
            lessons: vec![lesson(11, "binding"), lesson(12, "mutability")],
            curated_questions: (1..=9).map(question).collect(),
        },
        Topic {
            id: DEEP_TOPIC,
            title: "Ownership".to_string(),
            description: "Moves and borrows".to_string(),
            icon: Some("key".to_string()),
            lessons: Vec::new(),
            curated_questions: (101..=130).map(question).collect(),
        },
        Topic {
            id: EMPTY_TOPIC,
            title: "Coming soon".to_string(),
            description: String::new(),
            icon: None,
            lessons: vec![lesson(31, "a"), lesson(32, "b"), lesson(33, "c")],
            curated_questions: Vec::new(),
        },
        Topic {
            id: LESSON_TOPIC,
            title: "Traits".to_string(),
            description: "Shared behaviour".to_string(),
            icon: None,
            lessons: (41..=46)
                .map(|id| lesson(id, &format!("focus {}", id)))
                .collect(),
            curated_questions: Vec::new(),
        },
    ]
}

/// Answer key for the curated questions above.
pub fn correct_index(question_id: i64) -> usize {
    (question_id % 4) as usize
}

pub fn history_record(
    user_id: &str,
    topic_id: i64,
    score: u32,
    seconds_per_question: u32,
    minutes_ago: i64,
) -> AttemptHistoryRecord {
    AttemptHistoryRecord {
        user_id: user_id.to_string(),
        topic_id,
        score,
        correct_count: score * 15 / 100,
        total_questions: 15,
        duration_seconds: seconds_per_question * 15,
        difficulty: DifficultyTier::Medium,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user_id: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header("x-user-id", user_id);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };

    (status, json)
}

pub async fn start_attempt(app: &Router, user_id: &str, topic_id: i64) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/v1/topics/{}/attempts", topic_id),
        Some(user_id),
        None,
    )
    .await
}

pub async fn submit_attempt(
    app: &Router,
    user_id: &str,
    topic_id: i64,
    answers: Value,
) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        &format!("/api/v1/topics/{}/attempts/submit", topic_id),
        Some(user_id),
        Some(serde_json::json!({ "answers": answers })),
    )
    .await
}

/// Builds an answers map for presented questions, answering the first `correct` right.
pub fn answers_for(presented: &Value, correct: usize) -> Value {
    let mut answers = serde_json::Map::new();
    for (position, question) in presented.as_array().unwrap().iter().enumerate() {
        let id = question["id"].as_i64().unwrap();
        let right = correct_index(id);
        let choice = if position < correct { right } else { (right + 1) % 4 };
        answers.insert(format!("q{}", id), Value::String(choice.to_string()));
    }
    Value::Object(answers)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest quiz outcome per (user, topic). Every graded attempt overwrites it, so a
/// failed retake clears completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressRecord {
    pub user_id: String,
    pub topic_id: i64,
    pub score: u32,
    pub completed: bool,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn from_attempt(
        user_id: &str,
        topic_id: i64,
        score: u32,
        passed: bool,
        now: DateTime<Utc>,
    ) -> ProgressRecord {
        ProgressRecord {
            user_id: user_id.to_string(),
            topic_id,
            score,
            completed: passed,
            completed_at: passed.then_some(now),
            updated_at: now,
        }
    }
}

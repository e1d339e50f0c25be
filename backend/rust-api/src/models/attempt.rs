use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::{DifficultyTier, Question};

/// One graded attempt. Append-only; owned by the attempt history store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttemptHistoryRecord {
    pub user_id: String,
    pub topic_id: i64,
    pub score: u32,
    pub correct_count: u32,
    pub total_questions: u32,
    pub duration_seconds: u32,
    pub difficulty: DifficultyTier,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Frozen copy of what was shown for one in-flight attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptSnapshot {
    pub presented_order: Vec<i64>,
    pub presented_questions: Vec<Question>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    pub difficulty: DifficultyTier,
    pub total_questions: u32,
}

impl AttemptSnapshot {
    /// Questions in presentation order. Ids missing from the payload are skipped;
    /// if nothing lines up the payload order is used as-is.
    pub fn ordered_questions(&self) -> Vec<Question> {
        let by_id: HashMap<i64, &Question> = self
            .presented_questions
            .iter()
            .map(|question| (question.id, question))
            .collect();

        let ordered: Vec<Question> = self
            .presented_order
            .iter()
            .filter_map(|id| by_id.get(id).map(|question| (*question).clone()))
            .collect();

        if ordered.is_empty() {
            self.presented_questions.clone()
        } else {
            ordered
        }
    }
}

/// Per (user, topic) memory of recently presented orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepetitionMemory {
    #[serde(default)]
    pub last_full_order_signature: String,
    #[serde(default)]
    pub recent_lead_signatures: Vec<String>,
}

/// A single submitted answer after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerChoice {
    Selected(usize),
    Missing,
    Invalid,
}

impl AnswerChoice {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Null => AnswerChoice::Missing,
            Value::Number(number) => number
                .as_u64()
                .and_then(|index| usize::try_from(index).ok())
                .map(AnswerChoice::Selected)
                .unwrap_or(AnswerChoice::Invalid),
            Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    AnswerChoice::Missing
                } else {
                    trimmed
                        .parse::<usize>()
                        .map(AnswerChoice::Selected)
                        .unwrap_or(AnswerChoice::Invalid)
                }
            }
            _ => AnswerChoice::Invalid,
        }
    }
}

/// Answers keyed by question id. Accepts `"q12"` or `"12"` keys and integer or
/// numeric-string values; anything else becomes [`AnswerChoice::Invalid`].
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(from = "Map<String, Value>")]
pub struct SubmittedAnswers(HashMap<i64, AnswerChoice>);

impl SubmittedAnswers {
    pub fn choice_for(&self, question_id: i64) -> AnswerChoice {
        self.0
            .get(&question_id)
            .copied()
            .unwrap_or(AnswerChoice::Missing)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for SubmittedAnswers {
    fn from(raw: Map<String, Value>) -> Self {
        let answers = raw
            .iter()
            .filter_map(|(key, value)| {
                let id = key.strip_prefix('q').unwrap_or(key).parse::<i64>().ok()?;
                Some((id, AnswerChoice::from_value(value)))
            })
            .collect();
        SubmittedAnswers(answers)
    }
}

impl FromIterator<(i64, AnswerChoice)> for SubmittedAnswers {
    fn from_iter<I: IntoIterator<Item = (i64, AnswerChoice)>>(iter: I) -> Self {
        SubmittedAnswers(iter.into_iter().collect())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub answers: SubmittedAnswers,
}

/// Question as shown to the learner; the correct index is withheld.
#[derive(Debug, Serialize, Deserialize)]
pub struct PresentedQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&Question> for PresentedQuestion {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id,
            prompt: question.prompt.clone(),
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartAttemptResponse {
    pub topic_id: i64,
    pub topic_title: String,
    pub questions: Vec<PresentedQuestion>,
    pub difficulty: DifficultyTier,
    pub difficulty_label: &'static str,
    pub total_questions: usize,
    pub pool_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionResult {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub correct_option_index: usize,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SubmitAttemptResponse {
    pub topic_id: i64,
    pub topic_title: String,
    pub score: u32,
    pub passed: bool,
    pub correct_count: u32,
    pub total_questions: u32,
    pub duration_seconds: u32,
    pub difficulty: DifficultyTier,
    pub question_results: Vec<QuestionResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_loose_answer_payloads() {
        let answers: SubmittedAnswers = serde_json::from_value(json!({
            "q1": "2",
            "2": 0,
            "q3": "two",
            "q4": -1,
            "q5": "",
            "q6": null,
            "q7": [1],
            "not-an-id": 1
        }))
        .unwrap();

        assert_eq!(answers.choice_for(1), AnswerChoice::Selected(2));
        assert_eq!(answers.choice_for(2), AnswerChoice::Selected(0));
        assert_eq!(answers.choice_for(3), AnswerChoice::Invalid);
        assert_eq!(answers.choice_for(4), AnswerChoice::Invalid);
        assert_eq!(answers.choice_for(5), AnswerChoice::Missing);
        assert_eq!(answers.choice_for(6), AnswerChoice::Missing);
        assert_eq!(answers.choice_for(7), AnswerChoice::Invalid);
        assert_eq!(answers.choice_for(99), AnswerChoice::Missing);
        assert_eq!(answers.len(), 7);
    }

    #[test]
    fn submit_request_defaults_to_no_answers() {
        let request: SubmitAttemptRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.answers.is_empty());
    }

    #[test]
    fn snapshot_orders_questions_by_presented_order() {
        let question = |id: i64| Question {
            id,
            prompt: format!("Q{}", id),
            options: vec!["a".into(), "b".into()],
            correct_option_index: 0,
        };
        let snapshot = AttemptSnapshot {
            presented_order: vec![3, 1, 42],
            presented_questions: vec![question(1), question(2), question(3)],
            started_at: Utc::now(),
            difficulty: DifficultyTier::Medium,
            total_questions: 3,
        };

        let ids: Vec<i64> = snapshot.ordered_questions().iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snapshot = AttemptSnapshot {
            presented_order: vec![7],
            presented_questions: vec![Question {
                id: 7,
                prompt: "Seven?".into(),
                options: vec!["yes".into(), "no".into()],
                correct_option_index: 0,
            }],
            started_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
            difficulty: DifficultyTier::Hard,
            total_questions: 1,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: AttemptSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.started_at, snapshot.started_at);
        assert_eq!(restored.difficulty, DifficultyTier::Hard);
        assert_eq!(restored.presented_questions, snapshot.presented_questions);
    }
}

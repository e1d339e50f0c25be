use serde::{Deserialize, Serialize};

/// Multiple-choice question. `correct_option_index` always points into `options`
/// once the question has passed through the pool builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    #[serde(alias = "question")]
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(alias = "correct")]
    pub correct_option_index: u32,
}

impl Question {
    pub fn correct_index(&self) -> usize {
        self.correct_option_index as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, alias = "keyPoints")]
    pub key_points: Vec<String>,
}

/// A quiz topic ("level") as stored by the content repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    #[serde(rename = "_id", alias = "id")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
    #[serde(default, alias = "quiz")]
    pub curated_questions: Vec<Question>,
}

/// Catalog entry returned by the topic listing.
#[derive(Debug, Serialize)]
pub struct TopicSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub lesson_count: usize,
    pub completed: bool,
    pub score: Option<u32>,
    pub pool_size: usize,
    pub questions_per_attempt: usize,
}

#[derive(Debug, Serialize)]
pub struct LessonView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub key_points: Vec<String>,
}

impl From<&Lesson> for LessonView {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            key_points: lesson.key_points.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TopicLessonsResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub icon: Option<String>,
    pub lessons: Vec<LessonView>,
    pub completed: bool,
    pub score: Option<u32>,
    pub pool_size: usize,
    pub questions_per_attempt: usize,
}

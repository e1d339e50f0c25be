use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use rand::{rngs::StdRng, SeedableRng};

use crate::config::QuizSettings;
use crate::error::QuizError;
use crate::metrics::{
    QUIZ_ATTEMPTS_TOTAL, QUIZ_FALLBACK_GRADING_TOTAL, QUIZ_SCORES, QUIZ_SEQUENCER_ATTEMPTS,
};
use crate::models::{
    AttemptHistoryRecord, AttemptSnapshot, DifficultyTier, LessonView, PresentedQuestion,
    ProgressRecord, Question, RepetitionMemory, StartAttemptResponse, SubmitAttemptResponse,
    SubmittedAnswers, Topic, TopicLessonsResponse, TopicSummary,
};
use crate::quiz::{
    build_pool, compose, grade, recommend_difficulty, scoring::attempt_duration_seconds,
    sequence, target_size, SequencedOrder, RECENT_ATTEMPTS_FOR_ADAPTIVE,
};
use crate::stores::{
    get_json, set_json, AttemptHistoryStore, ContentRepository, ProgressStore, SessionKey,
    SessionStore,
};

use super::Stores;

/// Questions drawn for one attempt, before anything is persisted.
struct Draw {
    pool_size: usize,
    order: SequencedOrder,
}

/// Attempt lifecycle: start (present and snapshot) and submit (grade and record).
pub struct QuizService {
    content: Arc<dyn ContentRepository>,
    history: Arc<dyn AttemptHistoryStore>,
    sessions: Arc<dyn SessionStore>,
    progress: Arc<dyn ProgressStore>,
    settings: QuizSettings,
    rng: Mutex<StdRng>,
}

impl QuizService {
    pub fn new(stores: &Stores, settings: QuizSettings) -> Self {
        let rng = match settings.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self {
            content: stores.content.clone(),
            history: stores.history.clone(),
            sessions: stores.sessions.clone(),
            progress: stores.progress.clone(),
            settings,
            rng: Mutex::new(rng),
        }
    }

    /// Catalog with the learner's completion state and quiz sizes.
    pub async fn list_topics(&self, user_id: &str) -> Result<Vec<TopicSummary>, QuizError> {
        let topics = self.content.list_topics().await?;
        let progress: HashMap<i64, ProgressRecord> = self
            .progress
            .list_progress(user_id)
            .await?
            .into_iter()
            .map(|record| (record.topic_id, record))
            .collect();

        Ok(topics
            .iter()
            .map(|topic| {
                let record = progress.get(&topic.id);
                let pool_size = self.pool_size(topic);

                TopicSummary {
                    id: topic.id,
                    title: topic.title.clone(),
                    description: topic.description.clone(),
                    icon: topic.icon.clone(),
                    lesson_count: topic.lessons.len(),
                    completed: record.is_some_and(|record| record.completed),
                    score: record.map(|record| record.score),
                    pool_size,
                    questions_per_attempt: target_size(
                        pool_size,
                        self.settings.questions_per_attempt,
                    ),
                }
            })
            .collect())
    }

    pub async fn topic_lessons(
        &self,
        user_id: &str,
        topic_id: i64,
    ) -> Result<TopicLessonsResponse, QuizError> {
        let topic = self.load_topic(topic_id).await?;
        let record = self.progress.get_progress(user_id, topic_id).await?;
        let pool_size = self.pool_size(&topic);

        Ok(TopicLessonsResponse {
            id: topic.id,
            title: topic.title.clone(),
            description: topic.description.clone(),
            icon: topic.icon.clone(),
            lessons: topic.lessons.iter().map(LessonView::from).collect(),
            completed: record.as_ref().is_some_and(|record| record.completed),
            score: record.as_ref().map(|record| record.score),
            pool_size,
            questions_per_attempt: target_size(pool_size, self.settings.questions_per_attempt),
        })
    }

    /// Draws, orders and presents a new attempt, replacing any attempt in flight.
    pub async fn start_attempt(
        &self,
        user_id: &str,
        topic_id: i64,
    ) -> Result<StartAttemptResponse, QuizError> {
        let topic = self.load_topic(topic_id).await?;

        let recent = self
            .history
            .recent_attempts_for_topic(user_id, topic_id, RECENT_ATTEMPTS_FOR_ADAPTIVE)
            .await?;
        let difficulty = recommend_difficulty(&recent);

        let repetition_key = SessionKey::repetition(user_id, topic_id);
        let memory: RepetitionMemory = get_json(self.sessions.as_ref(), &repetition_key)
            .await?
            .unwrap_or_default();

        let Some(draw) = self.draw_attempt(&topic, difficulty, &memory) else {
            tracing::info!(topic_id, "Topic has no usable quiz questions");
            return Err(QuizError::EmptyPool(topic_id));
        };

        QUIZ_SEQUENCER_ATTEMPTS.observe(draw.order.attempts as f64);
        if !draw.order.novel {
            tracing::debug!(
                topic_id,
                user_id,
                "Accepted a repeating order after exhausting reshuffles"
            );
        }

        let questions = draw.order.questions;
        let snapshot = AttemptSnapshot {
            presented_order: questions.iter().map(|question| question.id).collect(),
            presented_questions: questions.clone(),
            started_at: Utc::now(),
            difficulty,
            total_questions: questions.len() as u32,
        };
        set_json(
            self.sessions.as_ref(),
            &SessionKey::attempt(user_id, topic_id),
            &snapshot,
            self.settings.attempt_ttl(),
        )
        .await?;

        QUIZ_ATTEMPTS_TOTAL.with_label_values(&["started"]).inc();
        tracing::info!(
            "Quiz attempt started for user {} on topic {}: {} of {} questions at {}",
            user_id,
            topic_id,
            questions.len(),
            draw.pool_size,
            difficulty
        );

        Ok(StartAttemptResponse {
            topic_id: topic.id,
            topic_title: topic.title,
            total_questions: questions.len(),
            questions: questions.iter().map(PresentedQuestion::from).collect(),
            difficulty,
            difficulty_label: difficulty.label(),
            pool_size: draw.pool_size,
        })
    }

    /// Grades the attempt in flight. Without a snapshot the submission is graded
    /// against a deterministic rebuild of the topic's pool.
    ///
    /// The snapshot is claimed (deleted) before anything is recorded, so a snapshot is
    /// graded at most once. Recording is at-least-once: if a later store write fails,
    /// a client retry is graded through the fallback path and appends another record.
    pub async fn submit_attempt(
        &self,
        user_id: &str,
        topic_id: i64,
        answers: SubmittedAnswers,
    ) -> Result<SubmitAttemptResponse, QuizError> {
        let topic = self.load_topic(topic_id).await?;
        let attempt_key = SessionKey::attempt(user_id, topic_id);
        let snapshot: Option<AttemptSnapshot> =
            get_json(self.sessions.as_ref(), &attempt_key).await?;
        self.sessions.delete(&attempt_key).await?;

        let now = Utc::now();
        let (questions, started_at, difficulty) = match snapshot {
            Some(snapshot) => (
                snapshot.ordered_questions(),
                snapshot.started_at,
                snapshot.difficulty,
            ),
            None => {
                tracing::warn!(
                    "No attempt snapshot for user {} on topic {}; grading against the rebuilt pool",
                    user_id,
                    topic_id
                );
                QUIZ_FALLBACK_GRADING_TOTAL.inc();
                (self.fallback_questions(&topic), now, DifficultyTier::Medium)
            }
        };

        if questions.is_empty() {
            return Err(QuizError::EmptyPool(topic_id));
        }

        let graded = grade(&questions, &answers);
        let duration_seconds = attempt_duration_seconds(started_at, now);

        self.history
            .append_attempt(AttemptHistoryRecord {
                user_id: user_id.to_string(),
                topic_id,
                score: graded.score,
                correct_count: graded.correct_count,
                total_questions: graded.total_questions,
                duration_seconds,
                difficulty,
                created_at: now,
            })
            .await?;

        self.progress
            .save_progress(ProgressRecord::from_attempt(
                user_id,
                topic_id,
                graded.score,
                graded.passed,
                now,
            ))
            .await?;

        let ids: Vec<i64> = questions.iter().map(|question| question.id).collect();
        let repetition_key = SessionKey::repetition(user_id, topic_id);
        let mut memory: RepetitionMemory = get_json(self.sessions.as_ref(), &repetition_key)
            .await?
            .unwrap_or_default();
        memory.remember(&ids);
        set_json(
            self.sessions.as_ref(),
            &repetition_key,
            &memory,
            self.settings.repetition_ttl(),
        )
        .await?;

        QUIZ_ATTEMPTS_TOTAL
            .with_label_values(&[if graded.passed { "passed" } else { "failed" }])
            .inc();
        QUIZ_SCORES
            .with_label_values(&[difficulty.as_str()])
            .observe(f64::from(graded.score));
        tracing::info!(
            "Quiz attempt graded for user {} on topic {}: {}% ({}/{}) in {}s",
            user_id,
            topic_id,
            graded.score,
            graded.correct_count,
            graded.total_questions,
            duration_seconds
        );

        Ok(SubmitAttemptResponse {
            topic_id: topic.id,
            topic_title: topic.title,
            score: graded.score,
            passed: graded.passed,
            correct_count: graded.correct_count,
            total_questions: graded.total_questions,
            duration_seconds,
            difficulty,
            question_results: graded.results,
        })
    }

    async fn load_topic(&self, topic_id: i64) -> Result<Topic, QuizError> {
        self.content
            .get_topic(topic_id)
            .await?
            .ok_or(QuizError::TopicNotFound(topic_id))
    }

    fn lock_rng(&self) -> MutexGuard<'_, StdRng> {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn pool_size(&self, topic: &Topic) -> usize {
        let mut rng = self.lock_rng();
        build_pool(topic, self.settings.questions_per_attempt, &mut *rng).len()
    }

    fn draw_attempt(
        &self,
        topic: &Topic,
        difficulty: DifficultyTier,
        memory: &RepetitionMemory,
    ) -> Option<Draw> {
        let per_attempt = self.settings.questions_per_attempt;
        let mut rng = self.lock_rng();

        let pool = build_pool(topic, per_attempt, &mut *rng);
        if pool.is_empty() {
            return None;
        }

        let candidates = compose(&pool, difficulty, per_attempt, &mut *rng);
        Some(Draw {
            pool_size: pool.len(),
            order: sequence(candidates, memory, &mut *rng),
        })
    }

    /// Whole pool built from a topic-seeded generator, so repeated fallbacks agree.
    fn fallback_questions(&self, topic: &Topic) -> Vec<Question> {
        let mut rng = StdRng::seed_from_u64(topic.id as u64);
        build_pool(topic, self.settings.questions_per_attempt, &mut rng)
    }
}

use rand::{seq::SliceRandom, Rng};
use std::collections::HashSet;

use crate::models::{Lesson, Question, Topic};

/// Topics need this many lessons before lesson-matching questions are synthesized.
pub const MIN_LESSONS_FOR_SYNTHESIS: usize = 4;

const DISTRACTOR_COUNT: usize = 3;
const FALLBACK_CLUE: &str = "core topic of this lesson";

/// Builds the deduplicated candidate pool for a topic.
///
/// Lesson-derived questions come first. When they alone reach `attempt_size` the curated
/// bank is left out, so deep topics are not capped by a small hand-written bank.
/// An empty result means "no quiz available" for the topic.
pub fn build_pool<R: Rng + ?Sized>(
    topic: &Topic,
    attempt_size: usize,
    rng: &mut R,
) -> Vec<Question> {
    let synthesized = synthesize_lesson_questions(&topic.lessons, rng);

    let source: Vec<Question> = if synthesized.len() >= attempt_size {
        synthesized
    } else {
        synthesized
            .into_iter()
            .chain(topic.curated_questions.iter().cloned())
            .collect()
    };

    let mut seen = HashSet::new();
    source
        .into_iter()
        .filter(|question| seen.insert(question.id))
        .filter(is_usable)
        .collect()
}

/// One "which lesson matches this focus" question per lesson, or nothing when the
/// topic has fewer than [`MIN_LESSONS_FOR_SYNTHESIS`] lessons.
pub fn synthesize_lesson_questions<R: Rng + ?Sized>(
    lessons: &[Lesson],
    rng: &mut R,
) -> Vec<Question> {
    if lessons.len() < MIN_LESSONS_FOR_SYNTHESIS {
        return Vec::new();
    }

    lessons
        .iter()
        .filter_map(|lesson| {
            let Some(id) = synthetic_question_id(lesson.id) else {
                tracing::warn!(lesson_id = lesson.id, "Skipping lesson with unusable id");
                return None;
            };

            let mut distractors: Vec<&str> = lessons
                .iter()
                .filter(|other| other.id != lesson.id)
                .map(|other| other.title.as_str())
                .collect();
            distractors.shuffle(rng);
            distractors.truncate(DISTRACTOR_COUNT);

            let mut options: Vec<(&str, bool)> = std::iter::once((lesson.title.as_str(), true))
                .chain(distractors.into_iter().map(|title| (title, false)))
                .collect();
            options.shuffle(rng);

            let correct = options.iter().position(|(_, is_correct)| *is_correct)?;
            let clue = lesson
                .key_points
                .first()
                .map(String::as_str)
                .unwrap_or(FALLBACK_CLUE);

            Some(Question {
                id,
                prompt: format!("Which lesson topic best matches this focus: \"{}\"?", clue),
                options: options.into_iter().map(|(title, _)| title.to_string()).collect(),
                correct_option_index: correct as u32,
            })
        })
        .collect()
}

/// Synthetic ids are the lesson id with a leading `9` (lesson 101 -> 9101), which keeps
/// them clear of the small integers used by curated banks.
fn synthetic_question_id(lesson_id: i64) -> Option<i64> {
    if lesson_id < 0 {
        return None;
    }
    format!("9{}", lesson_id).parse().ok()
}

fn is_usable(question: &Question) -> bool {
    question.options.len() >= 2 && question.correct_index() < question.options.len()
}

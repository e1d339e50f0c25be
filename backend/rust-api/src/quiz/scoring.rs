use chrono::{DateTime, Utc};

use crate::models::{AnswerChoice, Question, QuestionResult, SubmittedAnswers};

/// Minimum score (inclusive) that passes a quiz.
pub const PASS_THRESHOLD: u32 = 70;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAttempt {
    pub correct_count: u32,
    pub total_questions: u32,
    pub score: u32,
    pub passed: bool,
    pub results: Vec<QuestionResult>,
}

/// Grades answers against the presented questions. Missing, unparseable and
/// out-of-range answers are simply incorrect.
pub fn grade(questions: &[Question], answers: &SubmittedAnswers) -> GradedAttempt {
    let results: Vec<QuestionResult> = questions
        .iter()
        .map(|question| {
            let selected_option = match answers.choice_for(question.id) {
                AnswerChoice::Selected(index) if index < question.options.len() => Some(index),
                _ => None,
            };

            QuestionResult {
                id: question.id,
                prompt: question.prompt.clone(),
                options: question.options.clone(),
                selected_option,
                correct_option_index: question.correct_index(),
                is_correct: selected_option == Some(question.correct_index()),
            }
        })
        .collect();

    let correct_count = results.iter().filter(|result| result.is_correct).count() as u32;
    let total_questions = results.len() as u32;
    let score = percentage(correct_count, total_questions);

    GradedAttempt {
        correct_count,
        total_questions,
        score,
        passed: score >= PASS_THRESHOLD,
        results,
    }
}

/// `round(100 * correct / total)`, or 0 for an empty attempt.
pub fn percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(correct) * 100.0 / f64::from(total)).round() as u32
}

/// Whole seconds between start and submission, never less than one.
pub fn attempt_duration_seconds(started_at: DateTime<Utc>, submitted_at: DateTime<Utc>) -> u32 {
    let millis = (submitted_at - started_at).num_milliseconds().max(0);
    let seconds = (millis as f64 / 1000.0).round();
    seconds.clamp(1.0, f64::from(u32::MAX)) as u32
}

use crate::models::{AttemptHistoryRecord, DifficultyTier, Question};

use super::RECENT_ATTEMPTS_FOR_ADAPTIVE;

/// At or under this pace an attempt counts as fluent.
pub const FAST_SECONDS_PER_QUESTION: f64 = 22.0;
/// At or over this pace the learner is struggling regardless of score.
pub const SLOW_SECONDS_PER_QUESTION: f64 = 40.0;

const STRONG_RECENT_SCORE: f64 = 88.0;
const STRONG_AVERAGE_SCORE: u32 = 82;
const WEAK_AVERAGE_SCORE: u32 = 60;

/// A pool split into ordinal difficulty buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TieredPool {
    pub easy: Vec<Question>,
    pub medium: Vec<Question>,
    pub hard: Vec<Question>,
}

impl TieredPool {
    pub fn tier(&self, tier: DifficultyTier) -> &[Question] {
        match tier {
            DifficultyTier::Easy => &self.easy,
            DifficultyTier::Medium => &self.medium,
            DifficultyTier::Hard => &self.hard,
        }
    }

    pub fn len(&self) -> usize {
        self.easy.len() + self.medium.len() + self.hard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bucket sizes for a pool of `total` questions: a 34/33/33 split rounded to the
/// nearest question, with Hard absorbing the remainder.
pub fn tier_sizes(total: usize) -> (usize, usize, usize) {
    let easy = (total * 34 + 50) / 100;
    let medium = (total * 33 + 50) / 100;
    let hard = total.saturating_sub(easy + medium);
    (easy, medium, hard)
}

/// Partitions a pool by ascending id: first third Easy, next third Medium, rest Hard.
///
/// Id position is the only signal content carries today, so this is a stand-in for
/// real item calibration (e.g. per-question pass rates), not a measurement.
pub fn classify(pool: &[Question]) -> TieredPool {
    let mut sorted = pool.to_vec();
    sorted.sort_by_key(|question| question.id);

    let (easy_len, medium_len, _) = tier_sizes(sorted.len());
    let mut rest = sorted.split_off(easy_len);
    let hard = rest.split_off(medium_len);

    TieredPool {
        easy: sorted,
        medium: rest,
        hard,
    }
}

/// Mean score rounded to the nearest integer.
pub fn average_score(attempts: &[AttemptHistoryRecord]) -> Option<u32> {
    if attempts.is_empty() {
        return None;
    }
    let total: u64 = attempts.iter().map(|attempt| u64::from(attempt.score)).sum();
    Some((total as f64 / attempts.len() as f64).round() as u32)
}

/// Mean seconds per question over attempts that carry timing data.
pub fn average_seconds_per_question(attempts: &[AttemptHistoryRecord]) -> Option<f64> {
    let paces: Vec<f64> = attempts
        .iter()
        .filter(|attempt| attempt.duration_seconds > 0 && attempt.total_questions > 0)
        .map(|attempt| f64::from(attempt.duration_seconds) / f64::from(attempt.total_questions))
        .collect();

    if paces.is_empty() {
        return None;
    }
    Some(paces.iter().sum::<f64>() / paces.len() as f64)
}

/// Recommends the next attempt's difficulty from history ordered newest first.
/// Only the newest [`RECENT_ATTEMPTS_FOR_ADAPTIVE`] attempts are considered.
pub fn recommend_difficulty(attempts: &[AttemptHistoryRecord]) -> DifficultyTier {
    let recent = &attempts[..attempts.len().min(RECENT_ATTEMPTS_FOR_ADAPTIVE)];
    let Some(avg_score) = average_score(recent) else {
        return DifficultyTier::Medium;
    };

    let pace = average_seconds_per_question(recent);
    // Untimed history never blocks promotion.
    let fluent = pace.unwrap_or(0.0) <= FAST_SECONDS_PER_QUESTION;

    let latest_two = &recent[..recent.len().min(2)];
    let latest_two_avg = latest_two
        .iter()
        .map(|attempt| f64::from(attempt.score))
        .sum::<f64>()
        / latest_two.len() as f64;

    if latest_two.len() == 2 && latest_two_avg >= STRONG_RECENT_SCORE && fluent {
        return DifficultyTier::Hard;
    }

    if avg_score >= STRONG_AVERAGE_SCORE && fluent {
        return DifficultyTier::Hard;
    }

    if avg_score < WEAK_AVERAGE_SCORE
        || pace.is_some_and(|seconds| seconds >= SLOW_SECONDS_PER_QUESTION)
    {
        return DifficultyTier::Easy;
    }

    DifficultyTier::Medium
}

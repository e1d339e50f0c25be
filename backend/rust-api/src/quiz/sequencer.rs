use rand::{seq::SliceRandom, Rng};

use crate::models::{Question, RepetitionMemory};

/// Questions that make up a lead signature.
pub const LEAD_SIZE: usize = 3;
/// Shuffles tried before an order is accepted even if it repeats.
pub const MAX_GENERATION_ATTEMPTS: usize = 10;
/// Lead signatures remembered per (user, topic).
pub const RECENT_LEADS_LIMIT: usize = 5;

/// Comma-joined ids of the first [`LEAD_SIZE`] questions.
pub fn lead_signature(ids: &[i64]) -> String {
    full_signature(&ids[..ids.len().min(LEAD_SIZE)])
}

/// Comma-joined ids of the whole order.
pub fn full_signature(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl RepetitionMemory {
    /// True when the order opens like a recent attempt or repeats the last one exactly.
    pub fn is_repeat(&self, ids: &[i64]) -> bool {
        let repeats_lead = self
            .recent_lead_signatures
            .iter()
            .any(|lead| *lead == lead_signature(ids));
        let repeats_order = !self.last_full_order_signature.is_empty()
            && self.last_full_order_signature == full_signature(ids);
        repeats_lead || repeats_order
    }

    /// Records a graded attempt's order, keeping the newest [`RECENT_LEADS_LIMIT`] leads.
    pub fn remember(&mut self, ids: &[i64]) {
        self.last_full_order_signature = full_signature(ids);
        self.recent_lead_signatures.push(lead_signature(ids));
        let overflow = self
            .recent_lead_signatures
            .len()
            .saturating_sub(RECENT_LEADS_LIMIT);
        self.recent_lead_signatures.drain(..overflow);
    }
}

/// Final presentation order for an attempt.
#[derive(Debug, Clone)]
pub struct SequencedOrder {
    pub questions: Vec<Question>,
    /// Shuffles performed, never more than [`MAX_GENERATION_ATTEMPTS`].
    pub attempts: usize,
    /// False when every shuffle collided and the last one was accepted anyway.
    pub novel: bool,
}

impl SequencedOrder {
    pub fn ids(&self) -> Vec<i64> {
        self.questions.iter().map(|question| question.id).collect()
    }
}

/// Orders a candidate set so it does not open like a recent attempt.
///
/// Only the given candidates are reshuffled; nothing is redrawn from the pool. After
/// [`MAX_GENERATION_ATTEMPTS`] collisions the last shuffle is accepted, which keeps
/// tiny pools playable.
pub fn sequence<R: Rng + ?Sized>(
    candidates: Vec<Question>,
    memory: &RepetitionMemory,
    rng: &mut R,
) -> SequencedOrder {
    let mut order = candidates;
    if order.len() <= 1 {
        return SequencedOrder {
            questions: order,
            attempts: 0,
            novel: true,
        };
    }

    for attempt in 1..=MAX_GENERATION_ATTEMPTS {
        order.shuffle(rng);
        let ids: Vec<i64> = order.iter().map(|question| question.id).collect();
        if !memory.is_repeat(&ids) {
            return SequencedOrder {
                questions: order,
                attempts: attempt,
                novel: true,
            };
        }
        tracing::debug!(attempt, lead = %lead_signature(&ids), "Rejected repeating quiz order");
    }

    SequencedOrder {
        questions: order,
        attempts: MAX_GENERATION_ATTEMPTS,
        novel: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::fixtures::questions;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn signatures_join_ids() {
        assert_eq!(lead_signature(&[4, 9, 1, 7]), "4,9,1");
        assert_eq!(lead_signature(&[4, 9]), "4,9");
        assert_eq!(full_signature(&[4, 9, 1, 7]), "4,9,1,7");
        assert_eq!(full_signature(&[]), "");
    }

    #[test]
    fn memory_keeps_five_newest_leads() {
        let mut memory = RepetitionMemory::default();
        for start in 1..=7 {
            memory.remember(&[start, start + 10, start + 20, start + 30]);
        }

        assert_eq!(memory.recent_lead_signatures.len(), RECENT_LEADS_LIMIT);
        assert_eq!(memory.recent_lead_signatures[0], "3,13,23");
        assert_eq!(memory.recent_lead_signatures[4], "7,17,27");
        assert_eq!(memory.last_full_order_signature, "7,17,27,37");
    }

    #[test]
    fn detects_repeated_lead_and_full_order() {
        let mut memory = RepetitionMemory::default();
        memory.remember(&[1, 2, 3, 4]);

        assert!(memory.is_repeat(&[1, 2, 3, 9]));
        assert!(memory.is_repeat(&[1, 2, 3, 4]));
        assert!(!memory.is_repeat(&[2, 1, 3, 4]));
        assert!(!RepetitionMemory::default().is_repeat(&[1, 2, 3]));
    }

    #[test]
    fn avoids_previous_full_order() {
        let pool = questions(1..=6);
        let previous: Vec<i64> = (1..=6).collect();

        for seed in 0..50 {
            let mut memory = RepetitionMemory::default();
            memory.remember(&previous);
            let mut rng = StdRng::seed_from_u64(seed);

            let order = sequence(pool.clone(), &memory, &mut rng);

            assert!(order.attempts <= MAX_GENERATION_ATTEMPTS);
            assert!(order.novel, "seed {} never escaped the previous order", seed);
            assert_ne!(full_signature(&order.ids()), full_signature(&previous));
            assert_ne!(lead_signature(&order.ids()), lead_signature(&previous));
        }
    }

    #[test]
    fn keeps_candidate_set_intact() {
        let pool = questions(1..=12);
        let mut rng = StdRng::seed_from_u64(21);

        let order = sequence(pool.clone(), &RepetitionMemory::default(), &mut rng);

        let mut ids = order.ids();
        ids.sort_unstable();
        assert_eq!(ids, (1..=12).collect::<Vec<_>>());
        assert_eq!(order.attempts, 1);
    }

    #[test]
    fn gives_up_after_bounded_attempts() {
        // Two questions have only two orders; both leads are remembered.
        let pool = questions(1..=2);
        let mut memory = RepetitionMemory::default();
        memory.remember(&[1, 2]);
        memory.remember(&[2, 1]);
        let mut rng = StdRng::seed_from_u64(0);

        let order = sequence(pool, &memory, &mut rng);

        assert_eq!(order.attempts, MAX_GENERATION_ATTEMPTS);
        assert!(!order.novel);
        assert_eq!(order.questions.len(), 2);
    }

    #[test]
    fn single_question_is_returned_as_is() {
        let mut memory = RepetitionMemory::default();
        memory.remember(&[1]);
        let mut rng = StdRng::seed_from_u64(0);

        let order = sequence(questions(1..=1), &memory, &mut rng);

        assert_eq!(order.ids(), vec![1]);
        assert_eq!(order.attempts, 0);
    }
}

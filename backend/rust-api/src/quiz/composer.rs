use rand::{seq::SliceRandom, Rng};

use crate::models::{DifficultyTier, Question};

use super::difficulty::classify;

/// Share of the target size a tier receives for a given recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Share {
    Percent(usize),
    Remainder,
}

/// Per-tier question counts for one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierQuotas {
    pub easy: usize,
    pub medium: usize,
    pub hard: usize,
}

impl TierQuotas {
    pub fn get(&self, tier: DifficultyTier) -> usize {
        match tier {
            DifficultyTier::Easy => self.easy,
            DifficultyTier::Medium => self.medium,
            DifficultyTier::Hard => self.hard,
        }
    }

    fn slot(&mut self, tier: DifficultyTier) -> &mut usize {
        match tier {
            DifficultyTier::Easy => &mut self.easy,
            DifficultyTier::Medium => &mut self.medium,
            DifficultyTier::Hard => &mut self.hard,
        }
    }

    pub fn total(&self) -> usize {
        self.easy + self.medium + self.hard
    }
}

/// Number of questions one attempt presents.
pub fn target_size(pool_size: usize, per_attempt: usize) -> usize {
    pool_size.min(per_attempt)
}

/// Tier order used both to settle rounding overshoot and to backfill exhausted tiers.
pub fn priority(difficulty: DifficultyTier) -> [DifficultyTier; 3] {
    match difficulty {
        DifficultyTier::Easy => [
            DifficultyTier::Easy,
            DifficultyTier::Medium,
            DifficultyTier::Hard,
        ],
        DifficultyTier::Medium => [
            DifficultyTier::Medium,
            DifficultyTier::Easy,
            DifficultyTier::Hard,
        ],
        DifficultyTier::Hard => [
            DifficultyTier::Hard,
            DifficultyTier::Medium,
            DifficultyTier::Easy,
        ],
    }
}

fn mix(difficulty: DifficultyTier) -> [(DifficultyTier, Share); 3] {
    match difficulty {
        DifficultyTier::Easy => [
            (DifficultyTier::Easy, Share::Percent(50)),
            (DifficultyTier::Medium, Share::Percent(35)),
            (DifficultyTier::Hard, Share::Percent(15)),
        ],
        DifficultyTier::Medium => [
            (DifficultyTier::Easy, Share::Percent(30)),
            (DifficultyTier::Medium, Share::Percent(45)),
            (DifficultyTier::Hard, Share::Percent(25)),
        ],
        // 2 / 2 / 11 at the default target of 15.
        DifficultyTier::Hard => [
            (DifficultyTier::Easy, Share::Percent(12)),
            (DifficultyTier::Medium, Share::Percent(12)),
            (DifficultyTier::Hard, Share::Remainder),
        ],
    }
}

/// Ceiling-rounded tier quotas summing to exactly `target`. Overshoot from rounding
/// is taken back from the lowest-priority tiers first, and the recommended tier always
/// keeps at least one slot.
pub fn tier_quotas(difficulty: DifficultyTier, target: usize) -> TierQuotas {
    let mut quotas = TierQuotas::default();
    let mut remainder_tier = None;

    for (tier, share) in mix(difficulty) {
        match share {
            Share::Percent(percent) => *quotas.slot(tier) = (target * percent).div_ceil(100),
            Share::Remainder => remainder_tier = Some(tier),
        }
    }

    if let Some(tier) = remainder_tier {
        *quotas.slot(tier) = target.saturating_sub(quotas.total());
    }

    let mut overshoot = quotas.total().saturating_sub(target);
    for tier in priority(difficulty).into_iter().rev() {
        if overshoot == 0 {
            break;
        }
        let slot = quotas.slot(tier);
        let cut = overshoot.min(*slot);
        *slot -= cut;
        overshoot -= cut;
    }

    // Small targets must not squeeze the recommended tier out entirely.
    if target > 0 && quotas.get(difficulty) == 0 {
        if let Some(donor) = priority(difficulty)
            .into_iter()
            .rev()
            .find(|tier| quotas.get(*tier) > 0)
        {
            *quotas.slot(donor) -= 1;
            *quotas.slot(difficulty) += 1;
        }
    }

    quotas
}

/// Draws the candidate set for one attempt.
///
/// Pools no larger than the target are returned whole. Otherwise each tier contributes
/// its quota from a shuffled order, shortfalls are backfilled in priority order, and the
/// result is shuffled so position does not reveal tier.
pub fn compose<R: Rng + ?Sized>(
    pool: &[Question],
    difficulty: DifficultyTier,
    per_attempt: usize,
    rng: &mut R,
) -> Vec<Question> {
    let target = target_size(pool.len(), per_attempt);
    if target >= pool.len() {
        let mut whole = pool.to_vec();
        whole.shuffle(rng);
        return whole;
    }

    let tiers = classify(pool);
    let quotas = tier_quotas(difficulty, target);
    let order = priority(difficulty);

    let mut selected = Vec::with_capacity(target);
    let mut leftovers: Vec<Vec<Question>> = Vec::with_capacity(3);

    for tier in order {
        let mut shuffled = tiers.tier(tier).to_vec();
        shuffled.shuffle(rng);
        let take = quotas.get(tier).min(shuffled.len());
        let rest = shuffled.split_off(take);
        selected.extend(shuffled);
        leftovers.push(rest);
    }

    for rest in leftovers {
        let missing = target.saturating_sub(selected.len());
        if missing == 0 {
            break;
        }
        selected.extend(rest.into_iter().take(missing));
    }

    selected.shuffle(rng);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::{fixtures::questions, QUESTIONS_PER_ATTEMPT};
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn tier_counts(selected: &[Question], pool: &[Question]) -> TierQuotas {
        let tiers = classify(pool);
        let ids = |tier: DifficultyTier| -> HashSet<i64> {
            tiers.tier(tier).iter().map(|q| q.id).collect()
        };
        let (easy, medium, hard) = (
            ids(DifficultyTier::Easy),
            ids(DifficultyTier::Medium),
            ids(DifficultyTier::Hard),
        );
        TierQuotas {
            easy: selected.iter().filter(|q| easy.contains(&q.id)).count(),
            medium: selected.iter().filter(|q| medium.contains(&q.id)).count(),
            hard: selected.iter().filter(|q| hard.contains(&q.id)).count(),
        }
    }

    #[test]
    fn quotas_follow_recommendation() {
        assert_eq!(
            tier_quotas(DifficultyTier::Hard, 15),
            TierQuotas { easy: 2, medium: 2, hard: 11 }
        );
        assert_eq!(
            tier_quotas(DifficultyTier::Medium, 15),
            TierQuotas { easy: 5, medium: 7, hard: 3 }
        );
        assert_eq!(
            tier_quotas(DifficultyTier::Easy, 15),
            TierQuotas { easy: 8, medium: 6, hard: 1 }
        );
    }

    #[test]
    fn small_targets_keep_the_recommended_tier() {
        assert_eq!(
            tier_quotas(DifficultyTier::Hard, 1),
            TierQuotas { easy: 0, medium: 0, hard: 1 }
        );
        assert_eq!(
            tier_quotas(DifficultyTier::Hard, 2),
            TierQuotas { easy: 0, medium: 1, hard: 1 }
        );
        for target in 1..=40 {
            for difficulty in DifficultyTier::ALL {
                assert!(tier_quotas(difficulty, target).get(difficulty) >= 1);
            }
        }
    }

    #[test]
    fn quotas_always_sum_to_target() {
        for target in 0..=40 {
            for difficulty in DifficultyTier::ALL {
                assert_eq!(tier_quotas(difficulty, target).total(), target);
            }
        }
    }

    #[test]
    fn returns_min_of_target_and_pool_size() {
        let mut rng = StdRng::seed_from_u64(11);
        for size in [0usize, 1, 5, 14, 15, 16, 30, 80] {
            let pool = questions(1..=size as i64);
            for difficulty in DifficultyTier::ALL {
                let selected = compose(&pool, difficulty, QUESTIONS_PER_ATTEMPT, &mut rng);
                assert_eq!(selected.len(), size.min(QUESTIONS_PER_ATTEMPT));

                let unique: HashSet<i64> = selected.iter().map(|q| q.id).collect();
                assert_eq!(unique.len(), selected.len());
            }
        }
    }

    #[test]
    fn small_pool_is_returned_whole() {
        let mut rng = StdRng::seed_from_u64(5);
        let pool = questions(1..=9);

        let selected = compose(&pool, DifficultyTier::Hard, QUESTIONS_PER_ATTEMPT, &mut rng);

        let mut ids: Vec<i64> = selected.iter().map(|q| q.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn hard_recommendation_skews_toward_hard_tier() {
        let mut rng = StdRng::seed_from_u64(99);
        let pool = questions(1..=30);

        let selected = compose(&pool, DifficultyTier::Hard, QUESTIONS_PER_ATTEMPT, &mut rng);
        let counts = tier_counts(&selected, &pool);

        // Hard has only 10 questions, so one slot is backfilled from Medium.
        assert_eq!(counts, TierQuotas { easy: 2, medium: 3, hard: 10 });
    }

    #[test]
    fn medium_recommendation_uses_medium_mix() {
        let mut rng = StdRng::seed_from_u64(4);
        let pool = questions(1..=60);

        let selected = compose(&pool, DifficultyTier::Medium, QUESTIONS_PER_ATTEMPT, &mut rng);

        assert_eq!(
            tier_counts(&selected, &pool),
            TierQuotas { easy: 5, medium: 7, hard: 3 }
        );
    }

    #[test]
    fn easy_recommendation_backfills_in_priority_order() {
        let mut rng = StdRng::seed_from_u64(8);
        // 17 questions: tiers of 6 / 6 / 5.
        let pool = questions(1..=17);

        let selected = compose(&pool, DifficultyTier::Easy, QUESTIONS_PER_ATTEMPT, &mut rng);

        // Easy wants 8 but has 6 and Medium is used up, so Hard fills the gap.
        assert_eq!(
            tier_counts(&selected, &pool),
            TierQuotas { easy: 6, medium: 6, hard: 3 }
        );
    }
}

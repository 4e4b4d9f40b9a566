use crate::models::VideoId;
use crate::utils::{day_number, stable_hash};
use chrono::NaiveDate;

// Numerical Recipes LCG constants, mod 2^32.
const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;

pub fn daily_seed(group_name: &str, day: NaiveDate) -> u32 {
    day_number(day) ^ stable_hash(group_name)
}

fn next_state(state: u32) -> u32 {
    state
        .wrapping_mul(LCG_MULTIPLIER)
        .wrapping_add(LCG_INCREMENT)
}

/// Picks `target_count` of `candidates` for `group_name` on `day`.
///
/// The result depends only on its inputs: same candidates, group and UTC day
/// always give the same picks, and the next day reshuffles. Candidate order
/// matters, so pass it in upstream order.
pub fn pick_daily(
    candidates: &[VideoId],
    group_name: &str,
    day: NaiveDate,
    target_count: usize,
) -> Vec<VideoId> {
    let mut shuffled = candidates.to_vec();
    let mut state = daily_seed(group_name, day);

    for i in (1..shuffled.len()).rev() {
        state = next_state(state);
        let j = (state as usize) % (i + 1);
        shuffled.swap(i, j);
    }

    shuffled.truncate(target_count);
    shuffled
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn candidates(n: usize) -> Vec<VideoId> {
        (0..n).map(|i| format!("vid{i}")).collect()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_day_same_picks() {
        let pool = candidates(20);
        let first = pick_daily(&pool, "bluey", day(2026, 10, 17), 4);
        let second = pick_daily(&pool, "bluey", day(2026, 10, 17), 4);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn picks_are_a_subset_without_duplicates() {
        let pool = candidates(20);
        let picks = pick_daily(&pool, "peppa pig", day(2026, 10, 18), 6);
        let unique: HashSet<_> = picks.iter().collect();
        assert_eq!(unique.len(), 6);
        assert!(picks.iter().all(|id| pool.contains(id)));
    }

    #[test]
    fn selection_changes_across_days() {
        let pool = candidates(30);
        let week: HashSet<Vec<VideoId>> = (1..=7)
            .map(|d| pick_daily(&pool, "numberblocks", day(2026, 10, d), 5))
            .collect();
        assert!(week.len() > 1, "a week of picks should not all be identical");
    }

    #[test]
    fn groups_rotate_independently() {
        let pool = candidates(30);
        let today = day(2026, 10, 17);
        assert_ne!(
            pick_daily(&pool, "bluey", today, 5),
            pick_daily(&pool, "wild kratts", today, 5)
        );
    }

    #[test]
    fn short_pool_returns_everything() {
        let pool = candidates(3);
        let picks = pick_daily(&pool, "bluey", day(2026, 1, 1), 10);
        assert_eq!(picks.len(), 3);
        assert!(pick_daily(&[], "bluey", day(2026, 1, 1), 10).is_empty());
    }

    #[test]
    fn zero_target_picks_nothing() {
        assert!(pick_daily(&candidates(5), "bluey", day(2026, 1, 1), 0).is_empty());
    }
}

//! Daily challenge sampling.
//!
//! # Invariants
//! - Templates are sampled uniformly without replacement.
//! - Every generated challenge has `expires_on == generated_day + 1`.

use crate::model::challenge::{Challenge, ChallengeTemplate};
use crate::model::day::CalendarDay;
use crate::model::user::UserId;
use rand::seq::SliceRandom;
use rand::Rng;

pub const DEFAULT_DAILY_CHALLENGE_COUNT: usize = 3;

/// Samples `pick` distinct templates from `catalog` and stamps them for
/// `user_id` on `as_of`.
///
/// Returns the whole catalog (in random order) when `pick` exceeds its size.
pub fn generate_daily_challenges<R>(
    user_id: UserId,
    as_of: CalendarDay,
    catalog: &[ChallengeTemplate],
    pick: usize,
    rng: &mut R,
) -> Vec<Challenge>
where
    R: Rng + ?Sized,
{
    catalog
        .choose_multiple(rng, pick)
        .map(|template| Challenge::from_template(user_id, template, as_of))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::generate_daily_challenges;
    use crate::engine::catalog::builtin_catalog;
    use crate::model::day::CalendarDay;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};
    use uuid::Uuid;

    fn day(value: &str) -> CalendarDay {
        value.parse().unwrap()
    }

    #[test]
    fn picks_distinct_templates_with_one_day_expiry() {
        let user_id = Uuid::new_v4();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let batch =
                generate_daily_challenges(user_id, day("2024-06-30"), builtin_catalog(), 3, &mut rng);
            assert_eq!(batch.len(), 3);

            let titles: HashSet<_> = batch.iter().map(|c| c.title.as_str()).collect();
            assert_eq!(titles.len(), 3);
            for challenge in &batch {
                assert_eq!(challenge.user_id, user_id);
                assert_eq!(challenge.generated_day, day("2024-06-30"));
                assert_eq!(challenge.expires_on, day("2024-07-01"));
                assert!(!challenge.is_completed);
                assert!(challenge.validate().is_ok());
            }
        }
    }

    #[test]
    fn oversized_pick_returns_whole_catalog() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = generate_daily_challenges(
            Uuid::new_v4(),
            day("2024-01-01"),
            &builtin_catalog()[..4],
            10,
            &mut rng,
        );
        assert_eq!(batch.len(), 4);
        assert!(generate_daily_challenges(Uuid::new_v4(), day("2024-01-01"), &[], 3, &mut rng)
            .is_empty());
    }

    #[test]
    fn every_template_gets_picked_at_a_similar_rate() {
        let catalog = builtin_catalog();
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts: HashMap<&str, u32> = HashMap::new();
        let rounds = 4_000;
        for _ in 0..rounds {
            for challenge in
                generate_daily_challenges(Uuid::nil(), day("2024-01-01"), catalog, 3, &mut rng)
            {
                *counts.entry(catalog_title(&challenge.title)).or_default() += 1;
            }
        }

        // Expected 600 hits per template; allow a wide band.
        assert_eq!(counts.len(), catalog.len());
        for (title, count) in counts {
            assert!((450..=750).contains(&count), "{title} picked {count} times");
        }
    }

    fn catalog_title(title: &str) -> &'static str {
        builtin_catalog()
            .iter()
            .find(|template| template.title == title)
            .map(|template| template.title)
            .expect("generated title comes from the catalog")
    }
}

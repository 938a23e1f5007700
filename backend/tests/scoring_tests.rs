//! Star scoring and rating breakdown tests
//!
//! A five-star review is worth `1 + discount / 5`, any other rating is worth
//! `discount / 5`. Discounts come from the fixed tier set.

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::scoring::{star_weight, total_star, DiscountTier, RatingBreakdown, StarTally};

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

fn rating_strategy() -> impl Strategy<Value = i32> {
    1..=5i32
}

fn discount_strategy() -> impl Strategy<Value = Option<i32>> {
    prop::option::of(prop::sample::select(vec![0, 5, 10, 15]))
}

fn reviews_strategy() -> impl Strategy<Value = Vec<(i32, Option<i32>)>> {
    prop::collection::vec((rating_strategy(), discount_strategy()), 0..50)
}

// ============================================================================
// Known values
// ============================================================================

mod star_weight_values {
    use super::*;

    #[test]
    fn five_stars_without_discount_is_one() {
        assert_eq!(star_weight(5, None), Decimal::ONE);
        assert_eq!(star_weight(5, Some(0)), Decimal::ONE);
    }

    #[test]
    fn five_stars_with_discount() {
        assert_eq!(star_weight(5, Some(5)), dec("2"));
        assert_eq!(star_weight(5, Some(10)), dec("3"));
        assert_eq!(star_weight(5, Some(15)), dec("4"));
    }

    #[test]
    fn lower_ratings_only_count_the_discount() {
        assert_eq!(star_weight(4, None), Decimal::ZERO);
        assert_eq!(star_weight(3, Some(10)), dec("2"));
        assert_eq!(star_weight(1, Some(15)), dec("3"));
    }

    #[test]
    fn total_star_sums_each_review() {
        let reviews = vec![(5, Some(10)), (3, Some(10)), (4, None)];
        assert_eq!(total_star(reviews), dec("5"));
    }

    #[test]
    fn no_reviews_is_zero() {
        assert_eq!(total_star(Vec::new()), Decimal::ZERO);
        assert_eq!(StarTally::new().total(), Decimal::ZERO);
    }
}

mod discount_tiers {
    use super::*;

    #[test]
    fn only_known_tiers_convert() {
        for tier in DiscountTier::ALL {
            let percent: i32 = tier.into();
            assert_eq!(DiscountTier::try_from(percent), Ok(tier));
        }
        assert!(DiscountTier::try_from(20).is_err());
        assert!(DiscountTier::try_from(-5).is_err());
    }
}

mod breakdown {
    use super::*;

    #[test]
    fn always_five_buckets_from_five_to_one() {
        let breakdown = RatingBreakdown::from_counts(vec![(4, 2)]);
        let stars: Vec<i32> = breakdown.buckets().iter().map(|b| b.star).collect();
        assert_eq!(stars, vec![5, 4, 3, 2, 1]);
        assert_eq!(breakdown.buckets()[1].total, 2);
        assert_eq!(breakdown.buckets()[0].total, 0);
    }

    #[test]
    fn serializes_as_plain_array() {
        let breakdown = RatingBreakdown::from_counts(vec![(5, 3), (1, 1)]);
        let json = serde_json::to_value(&breakdown).unwrap();
        assert_eq!(json[0]["star"], 5);
        assert_eq!(json[0]["total"], 3);
        assert_eq!(json[4]["star"], 1);
        assert_eq!(json[4]["total"], 1);
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn star_weight_stays_in_range(rating in rating_strategy(), discount in discount_strategy()) {
        let weight = star_weight(rating, discount);
        prop_assert!(weight >= Decimal::ZERO);
        prop_assert!(weight <= dec("4"));
    }

    #[test]
    fn five_stars_is_worth_one_more(discount in discount_strategy(), rating in 1..=4i32) {
        prop_assert_eq!(star_weight(5, discount) - star_weight(rating, discount), Decimal::ONE);
    }

    #[test]
    fn tally_matches_review_by_review_total(reviews in reviews_strategy()) {
        let mut tally = StarTally::new();
        for (rating, discount) in &reviews {
            tally.add(*rating, *discount, 1);
        }
        prop_assert_eq!(tally.total(), total_star(reviews.clone()));
        prop_assert_eq!(tally.reviews(), reviews.len() as i64);
    }

    #[test]
    fn grouped_tally_matches_expanded_rows(
        rating in rating_strategy(),
        discount in discount_strategy(),
        count in 0..100i64,
    ) {
        let mut grouped = StarTally::new();
        grouped.add(rating, discount, count);

        let expanded = total_star(std::iter::repeat((rating, discount)).take(count as usize));
        prop_assert_eq!(grouped.total(), expanded);
        prop_assert_eq!(grouped.reviews(), count);
    }

    #[test]
    fn breakdown_sums_to_review_count(reviews in reviews_strategy()) {
        let counts = reviews.iter().map(|(rating, _)| (*rating, 1i64));
        let breakdown = RatingBreakdown::from_counts(counts);

        prop_assert_eq!(breakdown.buckets().len(), 5);
        prop_assert_eq!(breakdown.review_count(), reviews.len() as i64);
        for (bucket, star) in breakdown.buckets().iter().zip((1..=5).rev()) {
            prop_assert_eq!(bucket.star, star);
            prop_assert!(bucket.total >= 0);
        }
    }
}

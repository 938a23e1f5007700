//! Star scoring
//!
//! A business's star total blends review ratings with the promotional
//! discount attached to each review. A five-star review is worth
//! `1 + discount / 5`, any other rating `discount / 5`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discount tiers a reviewer may attach to a review (percent)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum DiscountTier {
    None,
    Five,
    Ten,
    Fifteen,
}

impl DiscountTier {
    pub const ALL: [DiscountTier; 4] = [
        DiscountTier::None,
        DiscountTier::Five,
        DiscountTier::Ten,
        DiscountTier::Fifteen,
    ];

    pub fn percent(self) -> i32 {
        match self {
            DiscountTier::None => 0,
            DiscountTier::Five => 5,
            DiscountTier::Ten => 10,
            DiscountTier::Fifteen => 15,
        }
    }
}

impl TryFrom<i32> for DiscountTier {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DiscountTier::None),
            5 => Ok(DiscountTier::Five),
            10 => Ok(DiscountTier::Ten),
            15 => Ok(DiscountTier::Fifteen),
            other => Err(format!("discount must be one of 0, 5, 10, 15 (got {})", other)),
        }
    }
}

impl From<DiscountTier> for i32 {
    fn from(tier: DiscountTier) -> Self {
        tier.percent()
    }
}

/// Weight of a single review; a missing discount counts as zero
pub fn star_weight(rating: i32, discount: Option<i32>) -> Decimal {
    let discount_part = Decimal::from(discount.unwrap_or(0)) / Decimal::from(5);
    if rating == 5 {
        Decimal::ONE + discount_part
    } else {
        discount_part
    }
}

/// Running star total built from grouped `(rating, discount, count)` rows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StarTally {
    total: Decimal,
    reviews: i64,
}

impl StarTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` reviews sharing the same rating and discount
    pub fn add(&mut self, rating: i32, discount: Option<i32>, count: i64) {
        if count <= 0 {
            return;
        }
        self.total += star_weight(rating, discount) * Decimal::from(count);
        self.reviews += count;
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn reviews(&self) -> i64 {
        self.reviews
    }
}

/// Sum of weights over individual `(rating, discount)` reviews
pub fn total_star<I>(reviews: I) -> Decimal
where
    I: IntoIterator<Item = (i32, Option<i32>)>,
{
    reviews
        .into_iter()
        .map(|(rating, discount)| star_weight(rating, discount))
        .sum()
}

/// Review count for one star value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingBucket {
    pub star: i32,
    pub total: i64,
}

/// Per-rating review counts, always five buckets ordered 5 down to 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct RatingBreakdown(Vec<RatingBucket>);

impl RatingBreakdown {
    /// Build from grouped `(rating, count)` rows; missing ratings become 0
    ///
    /// Ratings outside 1..=5 are rejected when a review is created, so any
    /// that slip through here are ignored.
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (i32, i64)>,
    {
        let mut totals = [0i64; 5];
        for (rating, count) in counts {
            if (1..=5).contains(&rating) {
                totals[(rating - 1) as usize] += count;
            }
        }

        Self(
            (1..=5)
                .rev()
                .map(|star| RatingBucket {
                    star,
                    total: totals[(star - 1) as usize],
                })
                .collect(),
        )
    }

    pub fn buckets(&self) -> &[RatingBucket] {
        &self.0
    }

    pub fn review_count(&self) -> i64 {
        self.0.iter().map(|b| b.total).sum()
    }
}

//! Reviews and rating aggregation

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{CommunicationRow, ReviewRow};
use shared::pagination::{PageRequest, PaginationMeta};
use shared::scoring::{RatingBreakdown, StarTally};
use shared::{CommunicationStatus, CreateReviewInput};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.rating, r.message, r.discount, r.business_id, r.user_id,
           r.communication_id, CONCAT(u.first_name, ' ', u.last_name) AS reviewer_name,
           r.created_at
    FROM reviews r
    LEFT JOIN users u ON u.id = r.user_id
"#;

/// Review service
#[derive(Clone)]
pub struct ReviewService {
    db: PgPool,
}

/// A page of a business's reviews with its aggregates
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessReviews {
    pub reviews: Vec<ReviewRow>,
    pub ratings: RatingBreakdown,
    pub total_star: Decimal,
}

impl ReviewService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Review the business behind a communication the caller made
    ///
    /// The communication must be SENDED; it becomes REVIEWED in the same
    /// transaction that stores the review.
    pub async fn create_review(
        &self,
        user: &AuthUser,
        input: CreateReviewInput,
    ) -> AppResult<ReviewRow> {
        let communication = sqlx::query_as::<_, CommunicationRow>(
            r#"
            SELECT id, business_id, user_id, type, message, status, created_at
            FROM communications
            WHERE id = $1
            "#,
        )
        .bind(input.communication_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Communication".to_string()))?;

        if communication.user_id != Some(user.user_id) {
            return Err(AppError::Forbidden(
                "You can only review your own communications".to_string(),
            ));
        }

        let current = communication.status()?;
        let next = current.mark_reviewed()?;

        let mut tx = self.db.begin().await?;

        let advanced = sqlx::query(
            r#"
            UPDATE communications
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(communication.id)
        .bind(current.as_str())
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if advanced == 0 {
            // Another request reviewed it first
            return Err(shared::TransitionError::AlreadyReviewed.into());
        }

        let review_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO reviews (business_id, user_id, communication_id, rating, message, discount)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(communication.business_id)
        .bind(user.user_id)
        .bind(communication.id)
        .bind(input.rating)
        .bind(input.message.trim())
        .bind(input.discount.map(i32::from))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            review_id = %review_id,
            business_id = %communication.business_id,
            rating = input.rating,
            to = CommunicationStatus::Reviewed.as_str(),
            "Review created"
        );

        self.fetch_review(review_id).await
    }

    /// Reviews of one business, newest first, with its rating breakdown
    pub async fn list_for_business(
        &self,
        business_id: Uuid,
        page: PageRequest,
    ) -> AppResult<(BusinessReviews, PaginationMeta)> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM businesses WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Business".to_string()));
        }

        let groups = sqlx::query_as::<_, (i32, Option<i32>, i64)>(
            r#"
            SELECT rating, discount, COUNT(*)
            FROM reviews
            WHERE business_id = $1
            GROUP BY rating, discount
            "#,
        )
        .bind(business_id)
        .fetch_all(&self.db)
        .await?;

        let (ratings, tally) = aggregate(&groups);

        let meta = PaginationMeta::for_request(&page, tally.reviews().max(0) as u64);
        meta.ensure_in_bounds()?;

        let reviews = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            {REVIEW_SELECT}
            WHERE r.business_id = $1
            ORDER BY r.created_at DESC, r.id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(business_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((
            BusinessReviews {
                reviews,
                ratings,
                total_star: tally.total(),
            },
            meta,
        ))
    }

    /// Every review on the platform, newest first
    pub async fn list_all(&self, page: PageRequest) -> AppResult<(Vec<ReviewRow>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews")
            .fetch_one(&self.db)
            .await?;

        let meta = PaginationMeta::for_request(&page, total.max(0) as u64);
        meta.ensure_in_bounds()?;

        let reviews = sqlx::query_as::<_, ReviewRow>(&format!(
            r#"
            {REVIEW_SELECT}
            ORDER BY r.created_at DESC, r.id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((reviews, meta))
    }

    async fn fetch_review(&self, id: Uuid) -> AppResult<ReviewRow> {
        sqlx::query_as::<_, ReviewRow>(&format!("{REVIEW_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Review".to_string()))
    }
}

/// Rating breakdown and star tally from `(rating, discount, count)` groups
fn aggregate(groups: &[(i32, Option<i32>, i64)]) -> (RatingBreakdown, StarTally) {
    let mut tally = StarTally::new();
    for &(rating, discount, count) in groups {
        tally.add(rating, discount, count);
    }
    let ratings = RatingBreakdown::from_counts(groups.iter().map(|&(rating, _, count)| (rating, count)));
    (ratings, tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_merges_discount_groups_per_rating() {
        let groups = vec![(5, Some(10), 1), (5, None, 2), (3, Some(10), 1)];
        let (ratings, tally) = aggregate(&groups);

        let stars: Vec<(i32, i64)> = ratings.buckets().iter().map(|b| (b.star, b.total)).collect();
        assert_eq!(stars, vec![(5, 3), (4, 0), (3, 1), (2, 0), (1, 0)]);
        assert_eq!(ratings.review_count(), 4);
        // (1 + 2) + 2 * 1 + 2
        assert_eq!(tally.total(), Decimal::from(7));
        assert_eq!(tally.reviews(), 4);
    }

    #[test]
    fn test_aggregate_empty() {
        let (ratings, tally) = aggregate(&[]);
        assert_eq!(ratings.buckets().len(), 5);
        assert_eq!(ratings.review_count(), 0);
        assert_eq!(tally.total(), Decimal::ZERO);
    }
}

//! Promotion management

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::PromotionRow;
use shared::pagination::{PageRequest, PaginationMeta};
use shared::CreatePromotionInput;

const PROMOTION_COLUMNS: &str =
    "id, business_id, title, discount, start_at, end_at, is_verified, created_at";

/// Promotion service
#[derive(Clone)]
pub struct PromotionService {
    db: PgPool,
}

impl PromotionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a promotion for the caller's business
    ///
    /// A business runs one promotion at a time: creation is refused while a
    /// previous promotion has not yet ended.
    pub async fn create_promotion(
        &self,
        user: &AuthUser,
        input: CreatePromotionInput,
    ) -> AppResult<PromotionRow> {
        let now = Utc::now();
        input.check(now)?;

        let mut tx = self.db.begin().await?;

        let business_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM businesses WHERE user_id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(user.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        let active = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM promotions WHERE business_id = $1 AND end_at >= $2",
        )
        .bind(business_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        if active > 0 {
            return Err(AppError::conflict(
                "promotion",
                "You already have an existing promotion",
            ));
        }

        let promotion = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            INSERT INTO promotions (business_id, title, discount, start_at, end_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(business_id)
        .bind(input.title.trim())
        .bind(input.discount)
        .bind(input.start_at)
        .bind(input.end_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(promotion_id = %promotion.id, business_id = %business_id, "Promotion created");

        Ok(promotion)
    }

    /// Most recent approved promotion of a business, if any
    pub async fn latest_for_business(&self, business_id: Uuid) -> AppResult<Option<PromotionRow>> {
        let promotion = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM promotions
            WHERE business_id = $1 AND is_verified = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(business_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(promotion)
    }

    /// Promotions waiting for approval, oldest first
    pub async fn list_unverified(
        &self,
        page: PageRequest,
    ) -> AppResult<(Vec<PromotionRow>, PaginationMeta)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM promotions WHERE is_verified = FALSE",
        )
        .fetch_one(&self.db)
        .await?;

        let meta = PaginationMeta::for_request(&page, total.max(0) as u64);
        meta.ensure_in_bounds()?;

        let promotions = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            SELECT {PROMOTION_COLUMNS}
            FROM promotions
            WHERE is_verified = FALSE
            ORDER BY created_at, id
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((promotions, meta))
    }

    pub async fn approve_promotion(&self, id: Uuid) -> AppResult<PromotionRow> {
        let promotion = sqlx::query_as::<_, PromotionRow>(&format!(
            r#"
            UPDATE promotions
            SET is_verified = TRUE
            WHERE id = $1
            RETURNING {PROMOTION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion".to_string()))?;

        tracing::info!(promotion_id = %id, "Promotion approved");

        Ok(promotion)
    }

    /// Delete a promotion; only the owning provider may do so
    pub async fn delete_promotion(&self, user: &AuthUser, id: Uuid) -> AppResult<()> {
        let owner = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT b.user_id
            FROM promotions p
            JOIN businesses b ON b.id = p.business_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Promotion".to_string()))?;

        if owner != user.user_id {
            return Err(AppError::Forbidden(
                "You are not allowed to delete this promotion".to_string(),
            ));
        }

        sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        tracing::info!(promotion_id = %id, "Promotion deleted");

        Ok(())
    }
}

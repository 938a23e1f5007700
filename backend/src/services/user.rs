//! Account administration: listing, dashboard totals and blocking

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::AccountRow;
use shared::pagination::{PageRequest, PaginationMeta};
use shared::{UserFilter, UserTotals, UserType};

const ACCOUNT_COLUMNS: &str =
    "id, email, first_name, last_name, user_type, is_deleted, last_login_at, created_at";

// Administrators are never listed; `$1` narrows to one non-admin type
const ACCOUNT_FILTER: &str = r#"
    user_type <> 'ADMIN'
    AND ($1::text IS NULL OR user_type = $1)
    AND ($2::text IS NULL OR first_name ILIKE $2 OR last_name ILIKE $2)
    AND ($3::timestamptz IS NULL OR created_at >= $3)
    AND ($4::timestamptz IS NULL OR created_at <= $4)
"#;

/// Account administration service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
}

impl UserService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Page of customer and provider accounts, newest first
    pub async fn list_users(
        &self,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<AccountRow>, PaginationMeta)> {
        let user_type = filter.user_type.map(|t| t.as_str());
        let name_pattern = filter.name_pattern();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM users WHERE {ACCOUNT_FILTER}"
        ))
        .bind(user_type)
        .bind(&name_pattern)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_one(&self.db)
        .await?;

        let meta = PaginationMeta::for_request(&page, total.max(0) as u64);
        meta.ensure_in_bounds()?;

        let users = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM users
            WHERE {ACCOUNT_FILTER}
            ORDER BY created_at DESC, id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(user_type)
        .bind(&name_pattern)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((users, meta))
    }

    /// Number of customer and provider accounts
    pub async fn totals(&self) -> AppResult<UserTotals> {
        let (total_customer, total_provider) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE user_type = 'CUSTOMER'),
                COUNT(*) FILTER (WHERE user_type = 'PROVIDER')
            FROM users
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(UserTotals {
            total_customer,
            total_provider,
        })
    }

    /// Block an account: it can no longer log in or refresh, and a
    /// provider's running subscription ends now
    pub async fn block_user(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let user_type = sqlx::query_scalar::<_, String>(
            "SELECT user_type FROM users WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        ensure_blockable(user_type.parse::<UserType>().map_err(AppError::Internal)?)?;

        sqlx::query("UPDATE users SET is_deleted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let revoked = sqlx::query(
            "UPDATE refresh_tokens SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let ended = sqlx::query(
            r#"
            UPDATE businesses
            SET subscription_end_at = NOW(), updated_at = NOW()
            WHERE user_id = $1 AND subscription_end_at > NOW()
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %id,
            user_type = %user_type,
            revoked_tokens = revoked.rows_affected(),
            subscription_ended = ended.rows_affected() > 0,
            "User blocked"
        );

        Ok(())
    }
}

/// Administrators cannot be blocked through the API
fn ensure_blockable(user_type: UserType) -> AppResult<()> {
    if user_type == UserType::Admin {
        return Err(AppError::Forbidden(
            "Administrators cannot be blocked".to_string(),
        ));
    }
    Ok(())
}

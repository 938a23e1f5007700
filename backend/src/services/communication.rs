//! Communication logging and the review-request lifecycle

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DiscoveryConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::CommunicationRow;
use shared::pagination::{PageRequest, PaginationMeta};
use shared::ranking::{next_priority_index, should_bump_priority};
use shared::{CommunicationStatus, CommunicationType, CreateCommunicationInput, UserType};

const COMMUNICATION_COLUMNS: &str =
    "id, business_id, user_id, type, message, status, created_at";

/// Communication service
#[derive(Clone)]
pub struct CommunicationService {
    db: PgPool,
    discovery: DiscoveryConfig,
}

impl CommunicationService {
    pub fn new(db: PgPool, discovery: DiscoveryConfig) -> Self {
        Self { db, discovery }
    }

    /// Record a contact and bump the business's priority when the visitor
    /// has not contacted it within the cooldown window
    pub async fn create_communication(
        &self,
        user: Option<&AuthUser>,
        input: CreateCommunicationInput,
    ) -> AppResult<CommunicationRow> {
        let message = input.message()?;
        if input.kind == CommunicationType::Message && user.is_none() {
            return Err(AppError::Unauthorized(
                "Login required to send a message".to_string(),
            ));
        }
        let user_id = user.map(|u| u.user_id);

        let mut tx = self.db.begin().await?;

        // Lock the business row so concurrent contacts from the same visitor
        // see each other when checking the cooldown
        let current_priority = sqlx::query_scalar::<_, i32>(
            "SELECT priority_index FROM businesses WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
        )
        .bind(input.business_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))?;

        // Anonymous visitors are all paired as one visitor (NULL user)
        let last_contact = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT created_at
            FROM communications
            WHERE business_id = $1 AND user_id IS NOT DISTINCT FROM $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(input.business_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let now = Utc::now();
        let bump = should_bump_priority(last_contact, now, self.discovery.contact_cooldown());

        let communication = sqlx::query_as::<_, CommunicationRow>(&format!(
            r#"
            INSERT INTO communications (business_id, user_id, type, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {COMMUNICATION_COLUMNS}
            "#
        ))
        .bind(input.business_id)
        .bind(user_id)
        .bind(input.kind.as_str())
        .bind(&message)
        .bind(CommunicationStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let priority_index = next_priority_index(current_priority, bump);
        if priority_index != current_priority {
            sqlx::query("UPDATE businesses SET priority_index = $2 WHERE id = $1")
                .bind(input.business_id)
                .bind(priority_index)
                .execute(&mut *tx)
                .await?;

            tracing::info!(
                business_id = %input.business_id,
                priority_index,
                "Business priority bumped"
            );
        }

        tx.commit().await?;

        tracing::info!(
            communication_id = %communication.id,
            business_id = %communication.business_id,
            kind = input.kind.as_str(),
            "Communication created"
        );

        Ok(communication)
    }

    /// Page of communications visible to `user`
    ///
    /// Administrators see everything; providers only their own business.
    pub async fn list_communications(
        &self,
        user: &AuthUser,
        page: PageRequest,
    ) -> AppResult<(Vec<CommunicationRow>, PaginationMeta)> {
        let business_id = match user.user_type {
            UserType::Admin => None,
            _ => Some(
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM businesses WHERE user_id = $1 AND is_deleted = FALSE",
                )
                .bind(user.user_id)
                .fetch_optional(&self.db)
                .await?
                .ok_or_else(|| AppError::NotFound("Business".to_string()))?,
            ),
        };

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM communications WHERE ($1::uuid IS NULL OR business_id = $1)",
        )
        .bind(business_id)
        .fetch_one(&self.db)
        .await?;

        let meta = PaginationMeta::for_request(&page, total.max(0) as u64);
        meta.ensure_in_bounds()?;

        let communications = sqlx::query_as::<_, CommunicationRow>(&format!(
            r#"
            SELECT {COMMUNICATION_COLUMNS}
            FROM communications
            WHERE ($1::uuid IS NULL OR business_id = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(business_id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.db)
        .await?;

        Ok((communications, meta))
    }

    /// A communication as read by `user`; see [`CommunicationRow::visible_to`]
    pub async fn get_communication_for(
        &self,
        user: &AuthUser,
        id: Uuid,
    ) -> AppResult<CommunicationRow> {
        let communication = self.get_communication(id).await?;

        let business_owner =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM businesses WHERE id = $1")
                .bind(communication.business_id)
                .fetch_one(&self.db)
                .await?;

        if !communication.visible_to(user, business_owner) {
            return Err(AppError::Forbidden(
                "You are not allowed to view this communication".to_string(),
            ));
        }
        Ok(communication)
    }

    async fn get_communication(&self, id: Uuid) -> AppResult<CommunicationRow> {
        sqlx::query_as::<_, CommunicationRow>(&format!(
            "SELECT {COMMUNICATION_COLUMNS} FROM communications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Communication".to_string()))
    }

    /// PENDING -> SENDED once the visitor has been asked for a review
    pub async fn mark_review_requested(&self, id: Uuid) -> AppResult<CommunicationRow> {
        let current = self.get_communication(id).await?;
        let next = current.review_request()?;

        let updated = sqlx::query_as::<_, CommunicationRow>(&format!(
            r#"
            UPDATE communications
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {COMMUNICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(CommunicationStatus::Pending.as_str())
        .bind(next.as_str())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::conflict("communication", "Communication status changed concurrently")
        })?;

        // Delivering the review request email is handled outside this service
        tracing::info!(
            communication_id = %id,
            from = CommunicationStatus::Pending.as_str(),
            to = next.as_str(),
            "Communication status changed"
        );

        Ok(updated)
    }
}

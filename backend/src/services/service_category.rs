//! Service category catalogue

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ServiceCategoryRow;
use shared::{CreateServiceInput, UpdateServiceInput};

/// Service category service
#[derive(Clone)]
pub struct ServiceCategoryService {
    db: PgPool,
}

impl ServiceCategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_services(&self) -> AppResult<Vec<ServiceCategoryRow>> {
        let services = sqlx::query_as::<_, ServiceCategoryRow>(
            "SELECT id, name, description, created_at FROM service_categories ORDER BY name",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(services)
    }

    pub async fn create_service(&self, input: CreateServiceInput) -> AppResult<ServiceCategoryRow> {
        shared::validate_not_blank("name", &input.name)?;
        let name = input.name.trim();
        self.ensure_name_available(name, None).await?;

        let service = sqlx::query_as::<_, ServiceCategoryRow>(
            r#"
            INSERT INTO service_categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(name)
        .bind(&input.description)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(service_id = %service.id, name = %service.name, "Service category created");

        Ok(service)
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        input: UpdateServiceInput,
    ) -> AppResult<ServiceCategoryRow> {
        if input.is_empty() {
            return Err(AppError::validation("body", "No valid data to update"));
        }

        let existing = sqlx::query_as::<_, ServiceCategoryRow>(
            "SELECT id, name, description, created_at FROM service_categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Service".to_string()))?;

        if let Some(ref name) = input.name {
            shared::validate_not_blank("name", name)?;
            self.ensure_name_available(name.trim(), Some(id)).await?;
        }

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.name);
        let description = input.description.or(existing.description);

        let service = sqlx::query_as::<_, ServiceCategoryRow>(
            r#"
            UPDATE service_categories
            SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&description)
        .fetch_one(&self.db)
        .await?;

        Ok(service)
    }

    /// Delete a category that no business references
    pub async fn delete_service(&self, id: Uuid) -> AppResult<()> {
        let in_use = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM businesses WHERE main_service_id = $1",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if in_use > 0 {
            return Err(AppError::conflict(
                "service",
                "Service is used by existing businesses",
            ));
        }

        let deleted = sqlx::query("DELETE FROM service_categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(AppError::NotFound("Service".to_string()));
        }

        tracing::info!(service_id = %id, "Service category deleted");

        Ok(())
    }

    async fn ensure_name_available(&self, name: &str, except: Option<Uuid>) -> AppResult<()> {
        let duplicate = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM service_categories
            WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id != $2)
            "#,
        )
        .bind(name)
        .bind(except)
        .fetch_one(&self.db)
        .await?;

        if duplicate > 0 {
            return Err(AppError::conflict(
                "service",
                "A service with this name already exists",
            ));
        }
        Ok(())
    }
}

//! Business listings and the discovery pipeline
//!
//! Discovery runs in stages: SQL applies the optional predicates and returns
//! lightweight candidates in insertion order, [`shared::ranking`] applies the
//! geo radius and orders them, [`shared::pagination`] checks the requested
//! page, and only the rows of that page are loaded and enriched with their
//! star score.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::DiscoveryConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{
    BusinessListing, BusinessRow, CandidateRow, StarGroupRow, BUSINESS_COLUMNS,
};
use shared::pagination::{page_slice, PaginationMeta};
use shared::ranking::{rank_candidates, RankCandidate};
use shared::scoring::StarTally;
use shared::{
    BusinessFilter, BusinessQuery, CreateBusinessInput, SetSubscriptionInput, UpdateBusinessInput,
};

/// Business service
#[derive(Clone)]
pub struct BusinessService {
    db: PgPool,
    discovery: DiscoveryConfig,
}

/// Star score of a provider's own business
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StarSummary {
    pub business_id: Uuid,
    pub total_star: Decimal,
    pub review_count: i64,
}

impl BusinessService {
    pub fn new(db: PgPool, discovery: DiscoveryConfig) -> Self {
        Self { db, discovery }
    }

    /// Create the provider's business; each provider owns at most one
    pub async fn create_business(
        &self,
        user: &AuthUser,
        input: CreateBusinessInput,
    ) -> AppResult<BusinessRow> {
        let location = input.check()?;

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM businesses WHERE user_id = $1",
        )
        .bind(user.user_id)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::Forbidden(
                "You already have a business".to_string(),
            ));
        }

        self.ensure_service_exists(input.main_service_id).await?;

        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO businesses (
                user_id, main_service_id, name, abn, about, license, mobile, phone,
                open_hour, address, suburb, state, postal_code, website, facebook,
                instagram, latitude, longitude
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id
            "#,
        )
        .bind(user.user_id)
        .bind(input.main_service_id)
        .bind(input.name.trim())
        .bind(&input.abn)
        .bind(&input.about)
        .bind(&input.license)
        .bind(&input.mobile)
        .bind(&input.phone)
        .bind(&input.open_hour)
        .bind(&input.address)
        .bind(&input.suburb)
        .bind(&input.state)
        .bind(&input.postal_code)
        .bind(&input.website)
        .bind(&input.facebook)
        .bind(&input.instagram)
        .bind(location.map(|p| p.latitude))
        .bind(location.map(|p| p.longitude))
        .fetch_one(&self.db)
        .await?;

        tracing::info!(business_id = %id, user_id = %user.user_id, "Business created");

        self.fetch_business(id).await
    }

    /// Get a business with its star score
    pub async fn get_business(&self, id: Uuid) -> AppResult<BusinessListing> {
        let business = self.fetch_business(id).await?;
        let mut stars = self.star_tallies(&[id]).await?;
        let tally = stars.remove(&id).unwrap_or_default();

        Ok(BusinessListing {
            business,
            total_star: tally.total(),
            review_count: tally.reviews(),
            distance_km: None,
        })
    }

    /// Partially update a business; only its owner may do so
    pub async fn update_business(
        &self,
        user: &AuthUser,
        id: Uuid,
        input: UpdateBusinessInput,
    ) -> AppResult<BusinessRow> {
        if input.is_empty() {
            return Err(AppError::validation("body", "No valid data to update"));
        }
        let location = input.check()?;

        let existing = self.fetch_business(id).await?;
        if existing.user_id != user.user_id {
            return Err(AppError::Forbidden(
                "You are not allowed to update this business".to_string(),
            ));
        }

        if let Some(service_id) = input.main_service_id {
            self.ensure_service_exists(service_id).await?;
        }

        let name = input
            .name
            .map(|n| n.trim().to_string())
            .unwrap_or(existing.name);
        let abn = input.abn.unwrap_or(existing.abn);
        let about = input.about.or(existing.about);
        let license = input.license.or(existing.license);
        let main_service_id = input.main_service_id.unwrap_or(existing.main_service_id);
        let mobile = input.mobile.unwrap_or(existing.mobile);
        let phone = input.phone.or(existing.phone);
        let open_hour = input.open_hour.or(existing.open_hour);
        let address = input.address.unwrap_or(existing.address);
        let suburb = input.suburb.or(existing.suburb);
        let state = input.state.unwrap_or(existing.state);
        let postal_code = input.postal_code.unwrap_or(existing.postal_code);
        let website = input.website.or(existing.website);
        let facebook = input.facebook.or(existing.facebook);
        let instagram = input.instagram.or(existing.instagram);
        let latitude = location.map(|p| p.latitude).or(existing.latitude);
        let longitude = location.map(|p| p.longitude).or(existing.longitude);

        sqlx::query(
            r#"
            UPDATE businesses
            SET name = $2, abn = $3, about = $4, license = $5, main_service_id = $6,
                mobile = $7, phone = $8, open_hour = $9, address = $10, suburb = $11,
                state = $12, postal_code = $13, website = $14, facebook = $15,
                instagram = $16, latitude = $17, longitude = $18, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&abn)
        .bind(&about)
        .bind(&license)
        .bind(main_service_id)
        .bind(&mobile)
        .bind(&phone)
        .bind(&open_hour)
        .bind(&address)
        .bind(&suburb)
        .bind(&state)
        .bind(&postal_code)
        .bind(&website)
        .bind(&facebook)
        .bind(&instagram)
        .bind(latitude)
        .bind(longitude)
        .execute(&self.db)
        .await?;

        tracing::info!(business_id = %id, "Business updated");

        self.fetch_business(id).await
    }

    /// Run the discovery pipeline for one page of results
    pub async fn discover(
        &self,
        query: &BusinessQuery,
    ) -> AppResult<(Vec<BusinessListing>, PaginationMeta)> {
        let filter = query.filter()?;
        let page = query.page_request(
            self.discovery.default_page_size,
            self.discovery.max_page_size,
        );

        let candidates = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, priority_index, latitude, longitude, subscription_end_at
            FROM businesses
            WHERE is_deleted = FALSE
              AND ($1::text IS NULL OR name ILIKE $1)
              AND ($2::uuid IS NULL OR main_service_id = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at, id
            "#,
        )
        .bind(filter.name_pattern())
        .bind(filter.service_id)
        .bind(filter.created_from)
        .bind(filter.created_to)
        .fetch_all(&self.db)
        .await?;

        let matched = candidates.len();
        let ranked = rank_candidates(
            active_candidates(candidates, &filter, Utc::now()),
            filter.origin,
            self.discovery.max_radius_km,
        );

        tracing::debug!(
            matched,
            ranked = ranked.len(),
            geo = filter.origin.is_some(),
            "Discovery candidates ranked"
        );

        let meta = PaginationMeta::for_request(&page, ranked.len() as u64);
        meta.ensure_in_bounds()?;

        let slice = page_slice(&ranked, &page);
        let ids: Vec<Uuid> = slice.iter().map(|r| r.id).collect();
        if ids.is_empty() {
            return Ok((Vec::new(), meta));
        }

        let rows = sqlx::query_as::<_, BusinessRow>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN service_categories s ON s.id = b.main_service_id
            WHERE b.id = ANY($1)
            "#
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;

        let mut rows: HashMap<Uuid, BusinessRow> = rows.into_iter().map(|r| (r.id, r)).collect();
        let mut stars = self.star_tallies(&ids).await?;

        // Keep the ranked order; rows are fetched unordered
        let listings = slice
            .iter()
            .filter_map(|ranked| {
                let business = rows.remove(&ranked.id)?;
                let tally = stars.remove(&ranked.id).unwrap_or_default();
                Some(BusinessListing {
                    business,
                    total_star: tally.total(),
                    review_count: tally.reviews(),
                    distance_km: ranked.distance_km,
                })
            })
            .collect();

        Ok((listings, meta))
    }

    /// Move a business's subscription expiry; administrators only
    pub async fn set_subscription(
        &self,
        id: Uuid,
        input: SetSubscriptionInput,
    ) -> AppResult<BusinessRow> {
        let updated = sqlx::query(
            r#"
            UPDATE businesses
            SET subscription_end_at = $2, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(input.subscription_end_at)
        .execute(&self.db)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("Business".to_string()));
        }

        tracing::info!(
            business_id = %id,
            subscription_end_at = %input.subscription_end_at,
            "Business subscription updated"
        );

        self.fetch_business(id).await
    }

    /// Soft delete a business; it disappears from every listing
    pub async fn delete_business(&self, id: Uuid) -> AppResult<()> {
        let deleted = sqlx::query(
            r#"
            UPDATE businesses
            SET is_deleted = TRUE, updated_at = NOW()
            WHERE id = $1 AND is_deleted = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        if deleted.rows_affected() == 0 {
            return Err(AppError::NotFound("Business".to_string()));
        }

        tracing::info!(business_id = %id, "Business deleted");
        Ok(())
    }

    /// Total star of the caller's own business
    pub async fn total_star_for_owner(&self, user: &AuthUser) -> AppResult<StarSummary> {
        let business_id = self.business_id_for_owner(user.user_id).await?;
        let mut stars = self.star_tallies(&[business_id]).await?;
        let tally = stars.remove(&business_id).unwrap_or_default();

        Ok(StarSummary {
            business_id,
            total_star: tally.total(),
            review_count: tally.reviews(),
        })
    }

    /// Businesses with the highest star total from recent reviews
    pub async fn best_businesses(&self) -> AppResult<Vec<BusinessListing>> {
        let since = Utc::now() - Duration::days(self.discovery.bests_window_days);

        let groups = sqlx::query_as::<_, StarGroupRow>(
            r#"
            SELECT r.business_id, r.rating, r.discount, COUNT(*) AS total
            FROM reviews r
            JOIN businesses b ON b.id = r.business_id
            WHERE r.created_at >= $1 AND b.is_deleted = FALSE
            GROUP BY r.business_id, r.rating, r.discount
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        let mut tallies = fold_star_groups(groups);
        let mut ranked: Vec<(Uuid, StarTally)> = tallies.drain().collect();
        // Highest total first; ties broken by id so the listing is deterministic
        ranked.sort_by(|a, b| b.1.total().cmp(&a.1.total()).then(a.0.cmp(&b.0)));
        ranked.truncate(self.discovery.bests_limit.max(0) as usize);

        let ids: Vec<Uuid> = ranked.iter().map(|(id, _)| *id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BusinessRow>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN service_categories s ON s.id = b.main_service_id
            WHERE b.id = ANY($1)
            "#
        ))
        .bind(&ids)
        .fetch_all(&self.db)
        .await?;
        let mut rows: HashMap<Uuid, BusinessRow> = rows.into_iter().map(|r| (r.id, r)).collect();

        Ok(ranked
            .into_iter()
            .filter_map(|(id, tally)| {
                rows.remove(&id).map(|business| BusinessListing {
                    business,
                    total_star: tally.total(),
                    review_count: tally.reviews(),
                    distance_km: None,
                })
            })
            .collect())
    }

    /// Id of the business owned by `user_id`
    pub async fn business_id_for_owner(&self, user_id: Uuid) -> AppResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM businesses WHERE user_id = $1 AND is_deleted = FALSE",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    async fn fetch_business(&self, id: Uuid) -> AppResult<BusinessRow> {
        sqlx::query_as::<_, BusinessRow>(&format!(
            r#"
            SELECT {BUSINESS_COLUMNS}
            FROM businesses b
            LEFT JOIN service_categories s ON s.id = b.main_service_id
            WHERE b.id = $1 AND b.is_deleted = FALSE
            "#
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business".to_string()))
    }

    async fn ensure_service_exists(&self, service_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM service_categories WHERE id = $1)",
        )
        .bind(service_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Service".to_string()));
        }
        Ok(())
    }

    /// Star tallies over all reviews of `ids`
    async fn star_tallies(&self, ids: &[Uuid]) -> AppResult<HashMap<Uuid, StarTally>> {
        let groups = sqlx::query_as::<_, StarGroupRow>(
            r#"
            SELECT business_id, rating, discount, COUNT(*) AS total
            FROM reviews
            WHERE business_id = ANY($1)
            GROUP BY business_id, rating, discount
            "#,
        )
        .bind(ids)
        .fetch_all(&self.db)
        .await?;

        Ok(fold_star_groups(groups))
    }
}

/// Candidates passing the subscription predicate, in their original order
fn active_candidates(
    rows: Vec<CandidateRow>,
    filter: &BusinessFilter,
    now: DateTime<Utc>,
) -> Vec<RankCandidate> {
    rows.into_iter()
        .filter(|row| filter.keeps_subscription(row.subscription_end_at, now))
        .map(RankCandidate::from)
        .collect()
}

/// Fold grouped review counts into one tally per business
fn fold_star_groups(groups: Vec<StarGroupRow>) -> HashMap<Uuid, StarTally> {
    let mut tallies: HashMap<Uuid, StarTally> = HashMap::new();
    for group in groups {
        tallies
            .entry(group.business_id)
            .or_default()
            .add(group.rating, group.discount, group.total);
    }
    tallies
}

//! Database row types for the BASP marketplace
//!
//! Input and domain types live in the shared crate; these are the shapes the
//! services read back from PostgreSQL. Enum columns are stored as TEXT and
//! parsed on demand.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use shared::{CommunicationStatus, GeoPoint, UserType};

/// Business columns returned by the API
pub const BUSINESS_COLUMNS: &str = r#"
    b.id, b.name, b.abn, b.about, b.license, b.main_service_id, b.mobile, b.phone,
    b.open_hour, b.address, b.suburb, b.state, b.postal_code, b.website, b.facebook,
    b.instagram, b.latitude, b.longitude, b.priority_index, b.subscription_end_at,
    b.user_id, b.created_at, b.updated_at, s.name AS main_service_name
"#;

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessRow {
    pub id: Uuid,
    pub name: String,
    pub abn: String,
    pub about: Option<String>,
    pub license: Option<String>,
    pub main_service_id: Uuid,
    pub mobile: String,
    pub phone: Option<String>,
    pub open_hour: Option<String>,
    pub address: String,
    pub suburb: Option<String>,
    pub state: String,
    pub postal_code: String,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub priority_index: i32,
    pub subscription_end_at: Option<DateTime<Utc>>,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub main_service_name: Option<String>,
}

/// A business enriched with its star score, as listed by discovery
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessListing {
    #[serde(flatten)]
    pub business: BusinessRow,
    pub total_star: Decimal,
    pub review_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// The lightweight projection fed into the ranking stage
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub priority_index: i32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub subscription_end_at: Option<DateTime<Utc>>,
}

impl From<CandidateRow> for shared::ranking::RankCandidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            id: row.id,
            priority_index: row.priority_index,
            location: GeoPoint::from_parts(row.latitude, row.longitude),
        }
    }
}

/// One `(business, rating, discount)` group of reviews
#[derive(Debug, Clone, FromRow)]
pub struct StarGroupRow {
    pub business_id: Uuid,
    pub rating: i32,
    pub discount: Option<i32>,
    pub total: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub user_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl CommunicationRow {
    pub fn status(&self) -> AppResult<CommunicationStatus> {
        self.status.parse().map_err(AppError::Internal)
    }

    /// Status after asking the visitor for a review
    ///
    /// Guests left no account to review from, so they cannot be asked.
    pub fn review_request(&self) -> AppResult<CommunicationStatus> {
        if self.user_id.is_none() {
            return Err(AppError::Forbidden(
                "Communication is from a guest user".to_string(),
            ));
        }
        Ok(self.status()?.mark_sent()?)
    }

    /// Administrators, the contacted business's owner and the visitor
    /// themselves may read a communication
    pub fn visible_to(&self, user: &AuthUser, business_owner: Uuid) -> bool {
        user.user_type == UserType::Admin
            || user.user_id == business_owner
            || self.user_id == Some(user.user_id)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRow {
    pub id: Uuid,
    pub rating: i32,
    pub message: String,
    pub discount: Option<i32>,
    pub business_id: Uuid,
    pub user_id: Uuid,
    pub communication_id: Uuid,
    pub reviewer_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionRow {
    pub id: Uuid,
    pub business_id: Uuid,
    pub title: String,
    pub discount: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of an account
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub created_at: DateTime<Utc>,
}

/// Account as listed to administrators
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: String,
    pub is_deleted: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

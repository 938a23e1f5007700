//! Promotion models

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::validation::{self, parse_required_uuid, ValidationResult};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromotionInput {
    #[validate(length(min = 1, max = 200, message = "Title is required"))]
    pub title: String,
    #[validate(range(min = 1, max = 100, message = "Discount must be between 1 and 100"))]
    pub discount: i32,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl CreatePromotionInput {
    pub fn check(&self, now: DateTime<Utc>) -> ValidationResult<()> {
        validation::validate_not_blank("title", &self.title)?;
        validation::validate_promotion_window(self.start_at, self.end_at, now)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionQuery {
    pub business_id: Option<String>,
}

impl PromotionQuery {
    pub fn business_id(&self) -> ValidationResult<Uuid> {
        parse_required_uuid("businessId", self.business_id.as_deref())
    }
}

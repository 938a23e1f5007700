//! Review models

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::pagination::PageRequest;
use crate::scoring::DiscountTier;
use crate::validation::{parse_page_number, parse_required_uuid, ValidationResult};

/// Input for reviewing a business after a communication
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    pub communication_id: Uuid,
    #[validate(range(min = 1, max = 5, message = "rating must be between 1 and 5"))]
    pub rating: i32,
    #[validate(length(min = 1, max = 2000, message = "message is required"))]
    pub message: String,
    pub discount: Option<DiscountTier>,
}

/// Raw query for a business's reviews
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQuery {
    pub business_id: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ReviewQuery {
    pub fn business_id(&self) -> ValidationResult<Uuid> {
        parse_required_uuid("businessId", self.business_id.as_deref())
    }

    pub fn page_request(&self, default_limit: u32, max_limit: u32) -> PageRequest {
        PageRequest::normalize(
            parse_page_number(self.page.as_deref()),
            parse_page_number(self.limit.as_deref()),
            default_limit,
            max_limit,
        )
    }
}

/// Raw page/limit query shared by plain list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self, default_limit: u32, max_limit: u32) -> PageRequest {
        PageRequest::normalize(
            parse_page_number(self.page.as_deref()),
            parse_page_number(self.limit.as_deref()),
            default_limit,
            max_limit,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rating: i32, discount: serde_json::Value) -> serde_json::Result<CreateReviewInput> {
        serde_json::from_value(serde_json::json!({
            "communicationId": Uuid::new_v4(),
            "rating": rating,
            "message": "Fixed the leak in an hour",
            "discount": discount
        }))
    }

    #[test]
    fn test_rating_range() {
        assert!(input(5, serde_json::Value::Null).unwrap().validate().is_ok());
        assert!(input(0, serde_json::Value::Null).unwrap().validate().is_err());
        assert!(input(6, serde_json::Value::Null).unwrap().validate().is_err());
    }

    #[test]
    fn test_discount_must_be_a_tier() {
        assert_eq!(
            input(5, serde_json::json!(10)).unwrap().discount,
            Some(DiscountTier::Ten)
        );
        assert!(input(5, serde_json::json!(12)).is_err());
    }

    #[test]
    fn test_review_query_requires_business() {
        assert!(ReviewQuery::default().business_id().is_err());
        let id = Uuid::new_v4();
        let q = ReviewQuery {
            business_id: Some(id.to_string()),
            ..Default::default()
        };
        assert_eq!(q.business_id(), Ok(id));
    }
}

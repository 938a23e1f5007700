//! Business listing models and discovery filters

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::pagination::PageRequest;
use crate::types::GeoPoint;
use crate::validation::{
    self, escape_like, parse_coordinate, parse_date_bound, parse_optional_bool,
    parse_optional_uuid, parse_page_number, validate_coordinates, validate_date_range,
    DateBound, ValidationResult,
};

/// Raw discovery query string, exactly as the client sent it
///
/// Everything is a string so malformed values surface as validation errors
/// in the response envelope instead of framework rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessQuery {
    pub name: Option<String>,
    pub service_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub active: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Parsed discovery predicates; `None` means "do not filter on this"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusinessFilter {
    /// Case-insensitive name prefix
    pub name_prefix: Option<String>,
    pub service_id: Option<Uuid>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    /// `Some(true)` keeps only businesses with a running subscription
    pub active: Option<bool>,
    pub origin: Option<GeoPoint>,
}

impl BusinessFilter {
    /// Name prefix as a ready-to-bind `ILIKE` pattern
    pub fn name_pattern(&self) -> Option<String> {
        self.name_prefix
            .as_deref()
            .map(|prefix| format!("{}%", escape_like(prefix)))
    }

    /// Apply the `active` predicate to a business's subscription expiry
    pub fn keeps_subscription(
        &self,
        subscription_end_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        match self.active {
            None => true,
            Some(active) => subscription_active(subscription_end_at, now) == active,
        }
    }
}

/// A subscription is running until its expiry; no expiry means none was bought
pub fn subscription_active(subscription_end_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    subscription_end_at.is_some_and(|end| end > now)
}

/// Administrator input moving a business's subscription expiry
///
/// A time in the past ends the subscription.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SetSubscriptionInput {
    pub subscription_end_at: DateTime<Utc>,
}

impl BusinessQuery {
    pub fn filter(&self) -> ValidationResult<BusinessFilter> {
        let latitude = parse_coordinate("latitude", self.latitude.as_deref())?;
        let longitude = parse_coordinate("longitude", self.longitude.as_deref())?;
        let origin = validate_coordinates(latitude, longitude)?;

        let created_from = parse_date_bound("startDate", self.start_date.as_deref(), DateBound::Start)?;
        let created_to = parse_date_bound("endDate", self.end_date.as_deref(), DateBound::End)?;
        validate_date_range(created_from, created_to)?;

        let name_prefix = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(BusinessFilter {
            name_prefix,
            service_id: parse_optional_uuid("serviceId", self.service_id.as_deref())?,
            created_from,
            created_to,
            active: parse_optional_bool("active", self.active.as_deref())?,
            origin,
        })
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

/// Input for creating a business listing
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBusinessInput {
    #[validate(length(min = 1, message = "ABN is required"))]
    pub abn: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    pub about: Option<String>,
    pub license: Option<String>,
    pub main_service_id: Uuid,
    #[validate(length(min = 1, message = "Mobile is required"))]
    pub mobile: String,
    pub phone: Option<String>,
    pub open_hour: Option<String>,
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    pub suburb: Option<String>,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "Postal code is required"))]
    pub postal_code: String,
    #[validate(url(message = "Website should be a valid URL"))]
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl CreateBusinessInput {
    /// Rules the derive cannot express
    pub fn check(&self) -> ValidationResult<Option<GeoPoint>> {
        validation::validate_not_blank("name", &self.name)?;
        validate_coordinates(self.latitude, self.longitude)
    }
}

/// Partial update of a business listing; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBusinessInput {
    pub abn: Option<String>,
    #[validate(length(min = 1, message = "Name should not be empty"))]
    pub name: Option<String>,
    pub about: Option<String>,
    pub license: Option<String>,
    pub main_service_id: Option<Uuid>,
    pub mobile: Option<String>,
    pub phone: Option<String>,
    pub open_hour: Option<String>,
    pub address: Option<String>,
    pub suburb: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    #[validate(url(message = "Website should be a valid URL"))]
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UpdateBusinessInput {
    pub fn is_empty(&self) -> bool {
        self.abn.is_none()
            && self.name.is_none()
            && self.about.is_none()
            && self.license.is_none()
            && self.main_service_id.is_none()
            && self.mobile.is_none()
            && self.phone.is_none()
            && self.open_hour.is_none()
            && self.address.is_none()
            && self.suburb.is_none()
            && self.state.is_none()
            && self.postal_code.is_none()
            && self.website.is_none()
            && self.facebook.is_none()
            && self.instagram.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }

    /// Rules the derive cannot express
    pub fn check(&self) -> ValidationResult<Option<GeoPoint>> {
        if let Some(name) = &self.name {
            validation::validate_not_blank("name", name)?;
        }
        validate_coordinates(self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> BusinessQuery {
        BusinessQuery::default()
    }

    #[test]
    fn test_empty_query_has_no_predicates() {
        assert_eq!(query().filter().unwrap(), BusinessFilter::default());
    }

    #[test]
    fn test_full_query_parses() {
        let service = Uuid::new_v4();
        let q = BusinessQuery {
            name: Some("  Plumb ".into()),
            service_id: Some(service.to_string()),
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-12-31".into()),
            active: Some("true".into()),
            latitude: Some("-33.8".into()),
            longitude: Some("151.2".into()),
            ..query()
        };
        let filter = q.filter().unwrap();
        assert_eq!(filter.name_prefix.as_deref(), Some("Plumb"));
        assert_eq!(filter.service_id, Some(service));
        assert_eq!(filter.active, Some(true));
        assert_eq!(filter.origin, Some(GeoPoint::new(-33.8, 151.2)));
        assert!(filter.created_from.unwrap() < filter.created_to.unwrap());
    }

    #[test]
    fn test_non_numeric_coordinate_is_rejected() {
        let q = BusinessQuery {
            latitude: Some("north".into()),
            longitude: Some("151.2".into()),
            ..query()
        };
        let err = q.filter().unwrap_err();
        assert_eq!(err.field, "latitude");
    }

    #[test]
    fn test_single_coordinate_is_rejected() {
        let q = BusinessQuery {
            latitude: Some("-33.8".into()),
            ..query()
        };
        assert!(q.filter().is_err());
    }

    #[test]
    fn test_name_pattern_escapes_wildcards() {
        let filter = BusinessFilter {
            name_prefix: Some("100%_".into()),
            ..Default::default()
        };
        assert_eq!(filter.name_pattern().as_deref(), Some("100\\%\\_%"));
    }

    #[test]
    fn test_page_request_is_lenient() {
        let q = BusinessQuery {
            page: Some("abc".into()),
            limit: Some("1000".into()),
            ..query()
        };
        assert_eq!(q.page_request(10, 100), PageRequest { page: 1, limit: 100 });
    }

    #[test]
    fn test_active_filter_follows_expiry() {
        let now = Utc::now();
        let future = Some(now + chrono::Duration::days(30));
        let past = Some(now - chrono::Duration::days(1));

        let active = BusinessFilter {
            active: Some(true),
            ..Default::default()
        };
        assert!(active.keeps_subscription(future, now));
        assert!(!active.keeps_subscription(past, now));
        assert!(!active.keeps_subscription(None, now));

        let expired = BusinessFilter {
            active: Some(false),
            ..Default::default()
        };
        assert!(!expired.keeps_subscription(future, now));
        assert!(expired.keeps_subscription(past, now));
        assert!(expired.keeps_subscription(None, now));

        assert!(BusinessFilter::default().keeps_subscription(None, now));
    }

    #[test]
    fn test_set_subscription_input_parses() {
        let input: SetSubscriptionInput = serde_json::from_value(serde_json::json!({
            "subscriptionEndAt": "2030-01-01T00:00:00Z"
        }))
        .unwrap();
        assert!(subscription_active(Some(input.subscription_end_at), Utc::now()));
    }

    #[test]
    fn test_update_input_emptiness() {
        assert!(UpdateBusinessInput::default().is_empty());
        let update = UpdateBusinessInput {
            phone: Some("0400000000".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_create_input_rejects_out_of_range_coordinates() {
        let input: CreateBusinessInput = serde_json::from_value(serde_json::json!({
            "abn": "12345678901",
            "name": "Acme Plumbing",
            "mainServiceId": Uuid::new_v4(),
            "mobile": "0400000000",
            "address": "1 George St",
            "state": "NSW",
            "postalCode": "2000",
            "latitude": 95.0,
            "longitude": 151.0
        }))
        .unwrap();
        assert!(input.validate().is_ok());
        assert_eq!(input.check().unwrap_err().field, "latitude");
    }
}

//! Validation utilities for the BASP marketplace
//!
//! Struct-level rules live on the input types as `validator` derives; the
//! helpers here cover what derives cannot express: raw query strings,
//! cross-field rules and LIKE escaping.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::geo;
use crate::types::GeoPoint;

/// A rejected input field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type ValidationResult<T> = Result<T, ValidationError>;

// ============================================================================
// Query string parsing
// ============================================================================

/// Treat absent and whitespace-only query values the same way
fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a coordinate half; a non-numeric value is an error, not a no-op
pub fn parse_coordinate(field: &str, raw: Option<&str>) -> ValidationResult<Option<f64>> {
    match present(raw) {
        None => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Some)
            .ok_or_else(|| ValidationError::new(field, format!("{} should be a number", field))),
    }
}

/// Check a coordinate pair: both or neither, and within range
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> ValidationResult<Option<GeoPoint>> {
    match (latitude, longitude) {
        (None, None) => Ok(None),
        (Some(_), None) => Err(ValidationError::new(
            "longitude",
            "longitude is required when latitude is given",
        )),
        (None, Some(_)) => Err(ValidationError::new(
            "latitude",
            "latitude is required when longitude is given",
        )),
        (Some(lat), Some(lng)) => {
            if !geo::is_valid_latitude(lat) {
                return Err(ValidationError::new(
                    "latitude",
                    "latitude must be between -90 and 90",
                ));
            }
            if !geo::is_valid_longitude(lng) {
                return Err(ValidationError::new(
                    "longitude",
                    "longitude must be between -180 and 180",
                ));
            }
            Ok(Some(GeoPoint::new(lat, lng)))
        }
    }
}

pub fn parse_optional_uuid(field: &str, raw: Option<&str>) -> ValidationResult<Option<Uuid>> {
    match present(raw) {
        None => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| ValidationError::new(field, format!("Invalid {}", field))),
    }
}

pub fn parse_required_uuid(field: &str, raw: Option<&str>) -> ValidationResult<Uuid> {
    parse_optional_uuid(field, raw)?
        .ok_or_else(|| ValidationError::new(field, format!("{} is required", field)))
}

/// Which end of a day a bare `YYYY-MM-DD` should snap to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    Start,
    End,
}

/// Parse an RFC 3339 timestamp or a bare date
///
/// A bare date covers the whole day: the start bound snaps to 00:00:00 and
/// the end bound to 23:59:59.999.
pub fn parse_date_bound(
    field: &str,
    raw: Option<&str>,
    bound: DateBound,
) -> ValidationResult<Option<DateTime<Utc>>> {
    let Some(value) = present(raw) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ValidationError::new(field, format!("{} should be a valid date", field)))?;
    let time = match bound {
        DateBound::Start => NaiveTime::from_hms_opt(0, 0, 0),
        DateBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999),
    }
    .ok_or_else(|| ValidationError::new(field, format!("{} should be a valid date", field)))?;
    Ok(Some(Utc.from_utc_datetime(&date.and_time(time))))
}

pub fn validate_date_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(ValidationError::new(
                "endDate",
                "endDate should be after startDate",
            ));
        }
    }
    Ok(())
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`)
pub fn parse_optional_bool(field: &str, raw: Option<&str>) -> ValidationResult<Option<bool>> {
    match present(raw).map(str::to_ascii_lowercase).as_deref() {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(_) => Err(ValidationError::new(
            field,
            format!("{} should be true or false", field),
        )),
    }
}

/// Lenient page/limit parsing: anything unparseable falls back to the default
pub fn parse_page_number(raw: Option<&str>) -> Option<i64> {
    present(raw).and_then(|v| v.parse::<i64>().ok())
}

// ============================================================================
// Text rules
// ============================================================================

/// Escape LIKE metacharacters so a user-supplied prefix matches literally
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reject strings that are empty once trimmed
pub fn validate_not_blank(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(
            field,
            format!("{} should not be empty", field),
        ));
    }
    Ok(())
}

/// Validate password strength
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.chars().count() < 8 {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

/// Promotions must end after they start and must not already be over
pub fn validate_promotion_window(
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> ValidationResult<()> {
    if end_at <= start_at {
        return Err(ValidationError::new("endAt", "endAt should be after startAt"));
    }
    if end_at <= now {
        return Err(ValidationError::new("endAt", "endAt should be in the future"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration, Timelike};

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("latitude", None), Ok(None));
        assert_eq!(parse_coordinate("latitude", Some("  ")), Ok(None));
        assert_eq!(parse_coordinate("latitude", Some("-33.86")), Ok(Some(-33.86)));
        assert!(parse_coordinate("latitude", Some("abc")).is_err());
        assert!(parse_coordinate("latitude", Some("NaN")).is_err());
    }

    #[test]
    fn test_validate_coordinates_pairs() {
        assert_eq!(validate_coordinates(None, None), Ok(None));
        assert!(validate_coordinates(Some(1.0), None).is_err());
        assert!(validate_coordinates(None, Some(1.0)).is_err());
        assert!(validate_coordinates(Some(91.0), Some(1.0)).is_err());
        assert!(validate_coordinates(Some(1.0), Some(-181.0)).is_err());
        assert_eq!(
            validate_coordinates(Some(1.0), Some(2.0)),
            Ok(Some(GeoPoint::new(1.0, 2.0)))
        );
    }

    #[test]
    fn test_parse_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_optional_uuid("serviceId", Some(&id.to_string())), Ok(Some(id)));
        assert_eq!(parse_optional_uuid("serviceId", None), Ok(None));
        assert!(parse_optional_uuid("serviceId", Some("nope")).is_err());
        assert!(parse_required_uuid("businessId", None).is_err());
    }

    #[test]
    fn test_parse_date_bounds() {
        let start = parse_date_bound("startDate", Some("2024-03-01"), DateBound::Start)
            .unwrap()
            .unwrap();
        assert_eq!((start.year(), start.month(), start.day(), start.hour()), (2024, 3, 1, 0));

        let end = parse_date_bound("endDate", Some("2024-03-01"), DateBound::End)
            .unwrap()
            .unwrap();
        assert_eq!((end.hour(), end.minute(), end.second()), (23, 59, 59));

        let exact = parse_date_bound("startDate", Some("2024-03-01T10:30:00Z"), DateBound::Start)
            .unwrap()
            .unwrap();
        assert_eq!(exact.hour(), 10);

        assert!(parse_date_bound("startDate", Some("01/03/2024"), DateBound::Start).is_err());
    }

    #[test]
    fn test_date_range_order() {
        let now = Utc::now();
        assert!(validate_date_range(Some(now), Some(now + Duration::days(1))).is_ok());
        assert!(validate_date_range(Some(now), Some(now - Duration::days(1))).is_err());
        assert!(validate_date_range(None, Some(now)).is_ok());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_optional_bool("active", Some("TRUE")), Ok(Some(true)));
        assert_eq!(parse_optional_bool("active", Some("0")), Ok(Some(false)));
        assert_eq!(parse_optional_bool("active", None), Ok(None));
        assert!(parse_optional_bool("active", Some("maybe")).is_err());
    }

    #[test]
    fn test_parse_page_number_is_lenient() {
        assert_eq!(parse_page_number(Some("3")), Some(3));
        assert_eq!(parse_page_number(Some("three")), None);
        assert_eq!(parse_page_number(None), None);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Joe's"), "Joe's");
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("name", "  ").is_err());
        assert!(validate_not_blank("name", "Acme").is_ok());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }

    #[test]
    fn test_promotion_window() {
        let now = Utc::now();
        assert!(validate_promotion_window(now, now + Duration::days(7), now).is_ok());
        assert!(validate_promotion_window(now, now, now).is_err());
        assert!(
            validate_promotion_window(now - Duration::days(9), now - Duration::days(2), now)
                .is_err()
        );
    }
}

//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::pagination::PaginationMeta;

/// A point on the earth's surface in decimal degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a point only when both halves of the coordinate are present
    pub fn from_parts(latitude: Option<f64>, longitude: Option<f64>) -> Option<Self> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Some(Self::new(lat, lng)),
            _ => None,
        }
    }
}

/// Account types. Every route guard is expressed in terms of these.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Admin,
    Customer,
    Provider,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Admin => "ADMIN",
            UserType::Customer => "CUSTOMER",
            UserType::Provider => "PROVIDER",
        }
    }
}

impl std::str::FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(UserType::Admin),
            "CUSTOMER" => Ok(UserType::Customer),
            "PROVIDER" => Ok(UserType::Provider),
            other => Err(format!("unknown user type: {}", other)),
        }
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response envelope returned by every endpoint
///
/// `pagination` serializes as `{}` for non-paginated reads so clients can
/// always destructure it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub status_code: u16,
    pub message: String,
    pub data: T,
    #[serde(with = "optional_object")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    pub fn success(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            ok: true,
            status_code,
            message: message.into(),
            data,
            pagination: None,
        }
    }

    pub fn paginated(
        status_code: u16,
        message: impl Into<String>,
        data: T,
        pagination: PaginationMeta,
    ) -> Self {
        Self {
            ok: true,
            status_code,
            message: message.into(),
            data,
            pagination: Some(pagination),
        }
    }
}

/// Empty JSON object used as `data` when an operation returns nothing
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Empty {}

mod optional_object {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::pagination::PaginationMeta;

    pub fn serialize<S>(value: &Option<PaginationMeta>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(meta) => meta.serialize(serializer),
            None => super::Empty {}.serialize(serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<PaginationMeta>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::Object(ref map) if map.is_empty() => Ok(None),
            other => serde_json::from_value(other)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

//! Error handling for the BASP marketplace server
//!
//! Every failure renders the same envelope as a successful response, with
//! `ok: false` and a machine-readable `code`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::pagination::PageOutOfBounds;
use shared::{TransitionError, ValidationError};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Conflict: {message}")]
    Conflict { resource: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Page {requested} not found")]
    PageNotFound { requested: u32, total_page: u32 },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Conflict {
            resource: resource.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::NotFound(_) | AppError::PageNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation {
            field: err.field,
            message: err.message,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first failing field; field order is not stable, so pick
        // the lexicographically smallest for deterministic responses.
        let field_errors = errors.field_errors();
        let first = field_errors
            .iter()
            .min_by_key(|(field, _)| **field)
            .and_then(|(field, errs)| errs.first().map(|e| (*field, e)));

        match first {
            Some((field, err)) => AppError::Validation {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field)),
            },
            None => AppError::validation("body", "Invalid request body"),
        }
    }
}

impl From<sqlx::Error> for AppError {
    /// A unique violation is a duplicate and renders as 409
    fn from(err: sqlx::Error) -> Self {
        let duplicate = err
            .as_database_error()
            .filter(|db| db.is_unique_violation())
            .map(|db| unique_conflict(db.constraint()));

        duplicate.unwrap_or(AppError::DatabaseError(err))
    }
}

/// Conflict for a violated unique constraint of the schema
fn unique_conflict(constraint: Option<&str>) -> AppError {
    match constraint {
        Some("users_email_key") => AppError::conflict("email", "Email is already registered"),
        Some("businesses_user_id_key") => {
            AppError::conflict("business", "You already have a business")
        }
        Some("idx_service_categories_name") => {
            AppError::conflict("service", "A service with this name already exists")
        }
        Some("reviews_communication_id_key") => {
            AppError::conflict("review", "You have already reviewed this business")
        }
        _ => AppError::conflict("resource", "Resource already exists"),
    }
}

impl From<PageOutOfBounds> for AppError {
    fn from(err: PageOutOfBounds) -> Self {
        AppError::PageNotFound {
            requested: err.requested,
            total_page: err.total_page,
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::NotYetReviewable => {
                AppError::Forbidden("You are not allowed to review this business now".to_string())
            }
            TransitionError::AlreadyReviewed => {
                AppError::Forbidden("You have already reviewed this business".to_string())
            }
            TransitionError::AlreadySent => {
                AppError::conflict("communication", "Review request was already sent")
            }
        }
    }
}

/// Error response structure
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub ok: bool,
    pub status_code: u16,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            status_code: status.as_u16(),
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (code, message, field) = match &self {
            AppError::InvalidCredentials => (
                "INVALID_CREDENTIALS",
                "Invalid email or password".to_string(),
                None,
            ),
            AppError::Unauthorized(message) => ("UNAUTHORIZED", message.clone(), None),
            AppError::Forbidden(message) => ("FORBIDDEN", message.clone(), None),
            AppError::Validation { field, message } => {
                ("VALIDATION_ERROR", message.clone(), Some(field.clone()))
            }
            AppError::Conflict { resource, message } => {
                ("CONFLICT", message.clone(), Some(resource.clone()))
            }
            AppError::NotFound(resource) => ("NOT_FOUND", format!("{} not found", resource), None),
            AppError::PageNotFound { .. } => ("PAGE_NOT_FOUND", "Page not found".to_string(), None),
            AppError::DatabaseError(_) => (
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            AppError::Internal(_) | AppError::InternalError(_) => (
                "INTERNAL_ERROR",
                "An internal server error occurred".to_string(),
                None,
            ),
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            field,
            ..ErrorResponse::new(status, code, message)
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::validation("name", "bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PageNotFound { requested: 4, total_page: 3 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Forbidden("no".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::conflict("promotion", "exists").status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_page_out_of_bounds_maps_to_404() {
        let err: AppError = PageOutOfBounds { requested: 5, total_page: 2 }.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_review_transition_errors_are_forbidden() {
        let err: AppError = TransitionError::NotYetReviewable.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err: AppError = TransitionError::AlreadyReviewed.into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validator_errors_carry_field() {
        let input = shared::LoginInput {
            email: "nope".into(),
            password: "secret".into(),
        };
        let err: AppError = input.validate().unwrap_err().into();
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "email");
                assert_eq!(message, "Invalid email format");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    /// Minimal driver error carrying a chosen kind and constraint
    #[derive(Debug)]
    struct FakeDbError {
        unique: bool,
        constraint: Option<&'static str>,
    }

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            if self.unique {
                sqlx::error::ErrorKind::UniqueViolation
            } else {
                sqlx::error::ErrorKind::Other
            }
        }
    }

    fn db_error(unique: bool, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { unique, constraint }))
    }

    #[test]
    fn test_unique_violation_maps_to_409() {
        let err: AppError = db_error(true, Some("businesses_user_id_key")).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert!(matches!(err, AppError::Conflict { ref resource, .. } if resource == "business"));

        let err: AppError = db_error(true, None).into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_other_database_errors_stay_500() {
        let err: AppError = db_error(false, None).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_envelope_shape() {
        let body = ErrorResponse::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Business not found");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["statusCode"], 404);
        assert!(json.get("field").is_none());
    }
}

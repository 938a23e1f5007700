//! HTTP handlers for the BASP marketplace API
//!
//! Every handler answers with the [`shared::ApiResponse`] envelope.

use axum::{http::StatusCode, Json};
use serde::Serialize;

use shared::pagination::PaginationMeta;
use shared::ApiResponse;

pub mod auth;
pub mod business;
pub mod communication;
pub mod health;
pub mod promotion;
pub mod review;
pub mod service_category;
pub mod user;

pub use auth::*;
pub use business::*;
pub use communication::*;
pub use health::*;
pub use promotion::*;
pub use review::*;
pub use service_category::*;
pub use user::*;

/// Handler result carrying the status code alongside the envelope
pub type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

pub fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> Reply<T> {
    (
        status,
        Json(ApiResponse::success(status.as_u16(), message, data)),
    )
}

pub fn reply_page<T: Serialize>(
    status: StatusCode,
    message: &str,
    data: T,
    pagination: PaginationMeta,
) -> Reply<T> {
    (
        status,
        Json(ApiResponse::paginated(status.as_u16(), message, data, pagination)),
    )
}

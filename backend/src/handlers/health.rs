//! Health check handlers

use axum::{extract::State, http::StatusCode};
use serde::Serialize;

use super::{reply, Reply};
use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Health check endpoint handler
pub async fn health_check(State(state): State<AppState>) -> Reply<HealthResponse> {
    // Check database connectivity
    let db_status = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => "connected".to_string(),
        Err(e) => {
            tracing::warn!("Health check database query failed: {}", e);
            "disconnected".to_string()
        }
    };

    reply(
        StatusCode::OK,
        "Service is healthy",
        HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: db_status,
        },
    )
}

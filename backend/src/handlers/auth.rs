//! Authentication HTTP handlers

use axum::{extract::State, http::StatusCode};

use super::{reply, Reply};
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::services::{auth::AuthSession, AuthService};
use crate::AppState;
use shared::{AuthTokens, LoginInput, RefreshInput, RegisterInput};

/// Register a customer or provider account
pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RegisterInput>,
) -> AppResult<Reply<AuthSession>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let session = service.register(input).await?;
    Ok(reply(StatusCode::CREATED, "Registration successful", session))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginInput>,
) -> AppResult<Reply<AuthSession>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let session = service.login(input).await?;
    Ok(reply(StatusCode::OK, "Login successful", session))
}

pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RefreshInput>,
) -> AppResult<Reply<AuthTokens>> {
    let service = AuthService::new(state.db.clone(), &state.config);
    let tokens = service.refresh_token(&input.refresh_token).await?;
    Ok(reply(StatusCode::OK, "Token refreshed", tokens))
}

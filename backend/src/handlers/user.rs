//! Account administration HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{reply, reply_page, Reply};
use crate::error::AppResult;
use crate::extract::ApiQuery;
use crate::middleware::CurrentUser;
use crate::models::AccountRow;
use crate::services::UserService;
use crate::AppState;
use shared::{Empty, UserQuery, UserTotals, UserType};

pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> AppResult<Reply<Vec<AccountRow>>> {
    user.require(&[UserType::Admin])?;
    let filter = query.filter()?;
    let discovery = &state.config.discovery;
    let page = query.page_request(discovery.default_page_size, discovery.max_page_size);
    let (users, meta) = UserService::new(state.db.clone())
        .list_users(&filter, page)
        .await?;
    Ok(reply_page(StatusCode::OK, "Users fetched successfully", users, meta))
}

/// Customer and provider counts for the dashboard
pub async fn get_user_totals(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Reply<UserTotals>> {
    user.require(&[UserType::Admin])?;
    let totals = UserService::new(state.db.clone()).totals().await?;
    Ok(reply(StatusCode::OK, "Totals fetched successfully", totals))
}

pub async fn block_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Reply<Empty>> {
    user.require(&[UserType::Admin])?;
    UserService::new(state.db.clone()).block_user(user_id).await?;
    Ok(reply(StatusCode::OK, "User blocked successfully", Empty {}))
}

//! Communication HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{reply, reply_page, Reply};
use crate::error::AppResult;
use crate::extract::{ApiQuery, ValidJson};
use crate::middleware::{CurrentUser, MaybeUser};
use crate::models::CommunicationRow;
use crate::services::CommunicationService;
use crate::AppState;
use shared::{CreateCommunicationInput, PageQuery, UserType};

fn service(state: &AppState) -> CommunicationService {
    CommunicationService::new(state.db.clone(), state.config.discovery.clone())
}

/// Log a call or message; anonymous visitors may only log calls
pub async fn create_communication(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    ValidJson(input): ValidJson<CreateCommunicationInput>,
) -> AppResult<Reply<CommunicationRow>> {
    let communication = service(&state)
        .create_communication(user.as_ref(), input)
        .await?;
    Ok(reply(
        StatusCode::CREATED,
        "Communication created successfully",
        communication,
    ))
}

pub async fn list_communications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Reply<Vec<CommunicationRow>>> {
    user.require(&[UserType::Admin, UserType::Provider])?;
    let discovery = &state.config.discovery;
    let page = query.page_request(discovery.default_page_size, discovery.max_page_size);
    let (communications, meta) = service(&state).list_communications(&user, page).await?;
    Ok(reply_page(
        StatusCode::OK,
        "Communications fetched successfully",
        communications,
        meta,
    ))
}

pub async fn get_communication(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(communication_id): Path<Uuid>,
) -> AppResult<Reply<CommunicationRow>> {
    let communication = service(&state)
        .get_communication_for(&user, communication_id)
        .await?;
    Ok(reply(
        StatusCode::OK,
        "Communication fetched successfully",
        communication,
    ))
}

/// Mark that the visitor has been asked for a review
pub async fn request_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(communication_id): Path<Uuid>,
) -> AppResult<Reply<CommunicationRow>> {
    user.require(&[UserType::Admin])?;
    let communication = service(&state)
        .mark_review_requested(communication_id)
        .await?;
    Ok(reply(
        StatusCode::OK,
        "Communication updated successfully",
        communication,
    ))
}

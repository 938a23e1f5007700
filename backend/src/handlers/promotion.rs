//! Promotion HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{reply, reply_page, Reply};
use crate::error::AppResult;
use crate::extract::{ApiQuery, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::PromotionRow;
use crate::services::PromotionService;
use crate::AppState;
use shared::{CreatePromotionInput, Empty, PageQuery, PromotionQuery, UserType};

pub async fn create_promotion(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<CreatePromotionInput>,
) -> AppResult<Reply<PromotionRow>> {
    user.require(&[UserType::Provider])?;
    let promotion = PromotionService::new(state.db.clone())
        .create_promotion(&user, input)
        .await?;
    Ok(reply(
        StatusCode::CREATED,
        "Promotion created successfully",
        promotion,
    ))
}

/// Latest approved promotion of a business; `data` is null when there is none
pub async fn get_business_promotion(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<PromotionQuery>,
) -> AppResult<Reply<Option<PromotionRow>>> {
    let business_id = query.business_id()?;
    let promotion = PromotionService::new(state.db.clone())
        .latest_for_business(business_id)
        .await?;
    Ok(reply(StatusCode::OK, "Promotion fetched successfully", promotion))
}

pub async fn list_unverified_promotions(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Reply<Vec<PromotionRow>>> {
    user.require(&[UserType::Admin])?;
    let discovery = &state.config.discovery;
    let page = query.page_request(discovery.default_page_size, discovery.max_page_size);
    let (promotions, meta) = PromotionService::new(state.db.clone())
        .list_unverified(page)
        .await?;
    Ok(reply_page(
        StatusCode::OK,
        "Promotions fetched successfully",
        promotions,
        meta,
    ))
}

pub async fn approve_promotion(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(promotion_id): Path<Uuid>,
) -> AppResult<Reply<PromotionRow>> {
    user.require(&[UserType::Admin])?;
    let promotion = PromotionService::new(state.db.clone())
        .approve_promotion(promotion_id)
        .await?;
    Ok(reply(StatusCode::OK, "Promotion approved successfully", promotion))
}

pub async fn delete_promotion(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(promotion_id): Path<Uuid>,
) -> AppResult<Reply<Empty>> {
    user.require(&[UserType::Provider])?;
    PromotionService::new(state.db.clone())
        .delete_promotion(&user, promotion_id)
        .await?;
    Ok(reply(StatusCode::OK, "Promotion deleted successfully", Empty {}))
}

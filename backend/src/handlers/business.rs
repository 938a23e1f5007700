//! Business listing and discovery HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{reply, reply_page, Reply};
use crate::error::AppResult;
use crate::extract::{ApiQuery, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::{BusinessListing, BusinessRow};
use crate::services::{business::StarSummary, BusinessService};
use crate::AppState;
use shared::{
    BusinessQuery, CreateBusinessInput, Empty, SetSubscriptionInput, UpdateBusinessInput, UserType,
};

fn service(state: &AppState) -> BusinessService {
    BusinessService::new(state.db.clone(), state.config.discovery.clone())
}

/// Discover businesses: filter, geo radius, ranking and one page of results
pub async fn discover_businesses(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BusinessQuery>,
) -> AppResult<Reply<Vec<BusinessListing>>> {
    let (businesses, meta) = service(&state).discover(&query).await?;
    Ok(reply_page(
        StatusCode::OK,
        "Businesses fetched successfully",
        businesses,
        meta,
    ))
}

pub async fn create_business(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<CreateBusinessInput>,
) -> AppResult<Reply<BusinessRow>> {
    user.require(&[UserType::Provider])?;
    let business = service(&state).create_business(&user, input).await?;
    Ok(reply(StatusCode::CREATED, "Business created successfully", business))
}

pub async fn get_business(
    State(state): State<AppState>,
    Path(business_id): Path<Uuid>,
) -> AppResult<Reply<BusinessListing>> {
    let business = service(&state).get_business(business_id).await?;
    Ok(reply(StatusCode::OK, "Business fetched successfully", business))
}

pub async fn update_business(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(business_id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateBusinessInput>,
) -> AppResult<Reply<BusinessRow>> {
    user.require(&[UserType::Provider])?;
    let business = service(&state)
        .update_business(&user, business_id, input)
        .await?;
    Ok(reply(StatusCode::OK, "Business updated successfully", business))
}

/// Set or extend a business's subscription
pub async fn set_business_subscription(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(business_id): Path<Uuid>,
    ValidJson(input): ValidJson<SetSubscriptionInput>,
) -> AppResult<Reply<BusinessRow>> {
    user.require(&[UserType::Admin])?;
    let business = service(&state)
        .set_subscription(business_id, input)
        .await?;
    Ok(reply(
        StatusCode::OK,
        "Business subscription updated successfully",
        business,
    ))
}

pub async fn delete_business(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(business_id): Path<Uuid>,
) -> AppResult<Reply<Empty>> {
    user.require(&[UserType::Admin])?;
    service(&state).delete_business(business_id).await?;
    Ok(reply(StatusCode::OK, "Business deleted successfully", Empty {}))
}

/// Star total of the caller's own business
pub async fn get_total_star(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Reply<StarSummary>> {
    user.require(&[UserType::Provider])?;
    let summary = service(&state).total_star_for_owner(&user).await?;
    Ok(reply(StatusCode::OK, "Total star fetched successfully", summary))
}

pub async fn get_best_businesses(
    State(state): State<AppState>,
) -> AppResult<Reply<Vec<BusinessListing>>> {
    let businesses = service(&state).best_businesses().await?;
    Ok(reply(StatusCode::OK, "Best businesses fetched successfully", businesses))
}

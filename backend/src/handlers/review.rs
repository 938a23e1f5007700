//! Review HTTP handlers

use axum::{extract::State, http::StatusCode};

use super::{reply, reply_page, Reply};
use crate::error::AppResult;
use crate::extract::{ApiQuery, ValidJson};
use crate::middleware::CurrentUser;
use crate::models::ReviewRow;
use crate::services::{review::BusinessReviews, ReviewService};
use crate::AppState;
use shared::{CreateReviewInput, PageQuery, ReviewQuery, UserType};

pub async fn create_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<CreateReviewInput>,
) -> AppResult<Reply<ReviewRow>> {
    user.require(&[UserType::Customer, UserType::Provider])?;
    let review = ReviewService::new(state.db.clone())
        .create_review(&user, input)
        .await?;
    Ok(reply(StatusCode::CREATED, "Review created successfully", review))
}

/// Reviews of one business with its rating breakdown
pub async fn list_business_reviews(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReviewQuery>,
) -> AppResult<Reply<BusinessReviews>> {
    let business_id = query.business_id()?;
    let discovery = &state.config.discovery;
    let page = query.page_request(discovery.default_page_size, discovery.max_page_size);
    let (reviews, meta) = ReviewService::new(state.db.clone())
        .list_for_business(business_id, page)
        .await?;
    Ok(reply_page(
        StatusCode::OK,
        "Reviews fetched successfully",
        reviews,
        meta,
    ))
}

pub async fn list_all_reviews(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(query): ApiQuery<PageQuery>,
) -> AppResult<Reply<Vec<ReviewRow>>> {
    user.require(&[UserType::Admin])?;
    let discovery = &state.config.discovery;
    let page = query.page_request(discovery.default_page_size, discovery.max_page_size);
    let (reviews, meta) = ReviewService::new(state.db.clone()).list_all(page).await?;
    Ok(reply_page(
        StatusCode::OK,
        "Reviews fetched successfully",
        reviews,
        meta,
    ))
}

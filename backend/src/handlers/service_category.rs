//! Service category HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use super::{reply, Reply};
use crate::error::AppResult;
use crate::extract::ValidJson;
use crate::middleware::CurrentUser;
use crate::models::ServiceCategoryRow;
use crate::services::ServiceCategoryService;
use crate::AppState;
use shared::{CreateServiceInput, Empty, UpdateServiceInput, UserType};

pub async fn list_services(
    State(state): State<AppState>,
) -> AppResult<Reply<Vec<ServiceCategoryRow>>> {
    let services = ServiceCategoryService::new(state.db.clone())
        .list_services()
        .await?;
    Ok(reply(StatusCode::OK, "Services fetched successfully", services))
}

pub async fn create_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidJson(input): ValidJson<CreateServiceInput>,
) -> AppResult<Reply<ServiceCategoryRow>> {
    user.require(&[UserType::Admin])?;
    let service = ServiceCategoryService::new(state.db.clone())
        .create_service(input)
        .await?;
    Ok(reply(StatusCode::CREATED, "Service created successfully", service))
}

pub async fn update_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(service_id): Path<Uuid>,
    ValidJson(input): ValidJson<UpdateServiceInput>,
) -> AppResult<Reply<ServiceCategoryRow>> {
    user.require(&[UserType::Admin])?;
    let service = ServiceCategoryService::new(state.db.clone())
        .update_service(service_id, input)
        .await?;
    Ok(reply(StatusCode::OK, "Service updated successfully", service))
}

pub async fn delete_service(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(service_id): Path<Uuid>,
) -> AppResult<Reply<Empty>> {
    user.require(&[UserType::Admin])?;
    ServiceCategoryService::new(state.db.clone())
        .delete_service(service_id)
        .await?;
    Ok(reply(StatusCode::OK, "Service deleted successfully", Empty {}))
}

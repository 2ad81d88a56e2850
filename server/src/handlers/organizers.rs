use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::Principal;
use crate::models::{OrganizerInput, Versioned};
use crate::services::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath};
use crate::utils::response::{created, empty_success, success};

pub async fn list_organizers(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AppError> {
    let organizers = state.organizers.list(&principal).await?;
    Ok(success(organizers, "Organizers"))
}

pub async fn get_organizer(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let organizer = state.organizers.get(&principal, id).await?;
    Ok(success(organizer, "Organizer"))
}

pub async fn create_organizer(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(input): ApiJson<OrganizerInput>,
) -> Result<Response, AppError> {
    let organizer = state.organizers.create(&principal, input).await?;
    Ok(created(organizer, "Organizer created"))
}

pub async fn update_organizer(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<Versioned<OrganizerInput>>,
) -> Result<Response, AppError> {
    let organizer = state.organizers.update(&principal, id, request).await?;
    Ok(success(organizer, "Organizer updated"))
}

pub async fn delete_organizer(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    state.organizers.delete(&principal, id).await?;
    Ok(empty_success("Organizer deleted"))
}

use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::Principal;
use crate::models::{SchoolEventInput, Versioned};
use crate::services::query::EventFilter;
use crate::services::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath, ApiQuery};
use crate::utils::response::{created, empty_success, success};

/// GET /events?from&to&type&search
pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<EventFilter>,
) -> Result<Response, AppError> {
    let index = state.events.list(filter).await?;
    let message = format!("{} event(s) found", index.events.len());
    Ok(success(index, message))
}

/// GET /events/:id
pub async fn event_details(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    let details = state.events.details(id).await?;
    Ok(success(details, "Event details"))
}

/// POST /events
pub async fn create_event(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(input): ApiJson<SchoolEventInput>,
) -> Result<Response, AppError> {
    let event = state.events.create(&principal, input).await?;
    Ok(created(event, "Event created"))
}

/// PUT /events/:id
pub async fn update_event(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<Versioned<SchoolEventInput>>,
) -> Result<Response, AppError> {
    let event = state.events.update(&principal, id, request).await?;
    Ok(success(event, "Event updated"))
}

/// DELETE /events/:id
pub async fn delete_event(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Response, AppError> {
    state.events.delete(&principal, id).await?;
    Ok(empty_success("Event deleted"))
}

use axum::extract::State;
use axum::response::Response;
use uuid::Uuid;

use crate::auth::Principal;
use crate::models::{ParticipantInput, RegistrationOutcome};
use crate::services::AppState;
use crate::utils::error::AppError;
use crate::utils::extract::{ApiJson, ApiPath};
use crate::utils::response::{created, success};

/// POST /events/:id/registrations
///
/// 201 for a new seat, 200 when the participant was already registered.
pub async fn register(
    State(state): State<AppState>,
    principal: Principal,
    ApiPath(event_id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ParticipantInput>,
) -> Result<Response, AppError> {
    let outcome = state
        .registrations
        .register(&principal, event_id, input)
        .await?;

    Ok(match outcome {
        RegistrationOutcome::Registered { .. } => created(outcome, "Successful registration!"),
        RegistrationOutcome::AlreadyRegistered { .. } => {
            success(outcome, "You're already registered for this event.")
        }
    })
}

/// GET /registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AppError> {
    let entries = state.registrations.list(&principal).await?;
    Ok(success(entries, "Registrations"))
}

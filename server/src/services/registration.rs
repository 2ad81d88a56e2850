use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Principal, Role};
use crate::models::{ParticipantInput, RegistrationEntry, RegistrationOutcome};
use crate::store::SchoolStore;
use crate::utils::error::AppError;

#[derive(Clone)]
pub struct RegistrationService {
    store: Arc<dyn SchoolStore>,
}

impl RegistrationService {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    /// Takes a seat for the participant, reusing an existing participant with
    /// the same email. A repeat registration is reported, not recorded twice.
    pub async fn register(
        &self,
        principal: &Principal,
        event_id: Uuid,
        input: ParticipantInput,
    ) -> Result<RegistrationOutcome, AppError> {
        principal.require(Role::Student)?;

        let input = input.normalized();
        input.validate()?;

        let outcome = self.store.register(event_id, input, Utc::now()).await?;

        match &outcome {
            RegistrationOutcome::Registered { registration, participant } => info!(
                %event_id,
                registration_id = %registration.id,
                participant_id = %participant.id,
                "Participant registered"
            ),
            RegistrationOutcome::AlreadyRegistered { participant } => info!(
                %event_id,
                participant_id = %participant.id,
                "Duplicate registration ignored"
            ),
        }

        Ok(outcome)
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<RegistrationEntry>, AppError> {
        principal.require(Role::Teacher)?;
        self.store.list_registrations().await
    }
}

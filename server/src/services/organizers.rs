use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{Principal, Role};
use crate::models::{Organizer, OrganizerInput, Versioned};
use crate::store::{organizer_not_found, SchoolStore};
use crate::utils::error::AppError;

/// Organizer administration; every operation is reserved for teachers.
#[derive(Clone)]
pub struct OrganizerService {
    store: Arc<dyn SchoolStore>,
}

impl OrganizerService {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<Organizer>, AppError> {
        principal.require(Role::Teacher)?;
        self.store.list_organizers().await
    }

    pub async fn get(&self, principal: &Principal, id: Uuid) -> Result<Organizer, AppError> {
        principal.require(Role::Teacher)?;
        self.store
            .get_organizer(id)
            .await?
            .ok_or_else(|| organizer_not_found(id))
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: OrganizerInput,
    ) -> Result<Organizer, AppError> {
        principal.require(Role::Teacher)?;

        let input = input.normalized();
        input.validate()?;

        let organizer = self
            .store
            .insert_organizer(input.into_organizer(Uuid::new_v4()))
            .await?;
        info!(organizer_id = %organizer.id, "Organizer created");
        Ok(organizer)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: Versioned<OrganizerInput>,
    ) -> Result<Organizer, AppError> {
        principal.require(Role::Teacher)?;

        let input = request.data.normalized();
        input.validate()?;

        let organizer = self.store.update_organizer(id, request.version, input).await?;
        info!(organizer_id = %id, version = organizer.version, "Organizer updated");
        Ok(organizer)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require(Role::Teacher)?;

        self.store.delete_organizer(id).await?;
        info!(organizer_id = %id, "Organizer deleted");
        Ok(())
    }
}

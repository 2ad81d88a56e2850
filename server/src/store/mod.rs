//! Persistence for organizers, participants, events and registrations.
//!
//! Each method is one atomic unit: multi-step mutations (register, guarded
//! deletes, optimistic updates) never expose an intermediate state to a
//! concurrent caller.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Organizer, OrganizerInput, ParticipantInput, RegistrationEntry, RegistrationOutcome,
    SchoolEvent, SchoolEventInput,
};
use crate::services::query::EventFilter;
use crate::utils::error::AppError;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait SchoolStore: Send + Sync {
    /// Ordered by name.
    async fn list_organizers(&self) -> Result<Vec<Organizer>, AppError>;

    async fn get_organizer(&self, id: Uuid) -> Result<Option<Organizer>, AppError>;

    async fn insert_organizer(&self, organizer: Organizer) -> Result<Organizer, AppError>;

    /// Applies `input` only if the stored row still has `expected_version`.
    async fn update_organizer(
        &self,
        id: Uuid,
        expected_version: i32,
        input: OrganizerInput,
    ) -> Result<Organizer, AppError>;

    /// Refuses with `Conflict` while any event references the organizer.
    async fn delete_organizer(&self, id: Uuid) -> Result<(), AppError>;

    /// Ascending by start.
    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<SchoolEvent>, AppError>;

    /// Events with `start <= start_at < end`, ascending by start.
    async fn events_starting_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SchoolEvent>, AppError>;

    async fn get_event(&self, id: Uuid) -> Result<Option<SchoolEvent>, AppError>;

    /// Fails with `NotFound` when the referenced organizer does not exist.
    async fn insert_event(&self, event: SchoolEvent) -> Result<SchoolEvent, AppError>;

    async fn update_event(
        &self,
        id: Uuid,
        expected_version: i32,
        input: SchoolEventInput,
    ) -> Result<SchoolEvent, AppError>;

    /// Refuses with `Conflict` while any registration references the event.
    async fn delete_event(&self, id: Uuid) -> Result<(), AppError>;

    /// Capacity check, participant resolution, duplicate check and insert,
    /// serialized per event.
    async fn register(
        &self,
        event_id: Uuid,
        participant: ParticipantInput,
        registered_at: DateTime<Utc>,
    ) -> Result<RegistrationOutcome, AppError>;

    /// Registrations of one event, oldest first.
    async fn event_registrations(&self, event_id: Uuid)
        -> Result<Vec<RegistrationEntry>, AppError>;

    /// All registrations, newest first.
    async fn list_registrations(&self) -> Result<Vec<RegistrationEntry>, AppError>;
}

/// Maps an optimistic update that matched no row to the caller-facing error.
pub(crate) fn update_miss(entity: &str, id: Uuid, still_exists: bool) -> AppError {
    if still_exists {
        AppError::ConcurrencyConflict(format!(
            "{} '{}' was modified by someone else; reload and try again",
            entity, id
        ))
    } else {
        AppError::NotFound(format!("{} '{}' was not found", entity, id))
    }
}

pub(crate) fn organizer_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Organizer '{}' was not found", id))
}

pub(crate) fn event_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Event '{}' was not found", id))
}

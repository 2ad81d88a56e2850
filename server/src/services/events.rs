use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Principal, Role};
use crate::models::{Organizer, RegistrationEntry, SchoolEvent, SchoolEventInput, Versioned};
use crate::services::query::{
    group_by_day, month_bounds, CalendarQuery, CalendarView, EventFilter, EventIndex,
};
use crate::store::{event_not_found, SchoolStore};
use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct EventDetails {
    pub event: SchoolEvent,
    pub organizer: Option<Organizer>,
    pub registrations: Vec<RegistrationEntry>,
    pub seats_taken: i64,
    pub seats_left: i64,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn SchoolStore>,
}

impl EventService {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, filter: EventFilter) -> Result<EventIndex, AppError> {
        let events = self.store.list_events(&filter).await?;
        Ok(EventIndex { filter, events })
    }

    pub async fn calendar(&self, query: CalendarQuery) -> Result<CalendarView, AppError> {
        let (year, month) = query.resolve();
        let (start, end) = month_bounds(year, month)?;

        let events = self.store.events_starting_between(start, end).await?;
        Ok(CalendarView {
            year,
            month,
            events_by_day: group_by_day(events),
        })
    }

    pub async fn details(&self, id: Uuid) -> Result<EventDetails, AppError> {
        let event = self
            .store
            .get_event(id)
            .await?
            .ok_or_else(|| event_not_found(id))?;
        let organizer = self.store.get_organizer(event.organizer_id).await?;
        let registrations = self.store.event_registrations(id).await?;

        let seats_taken = registrations.len() as i64;
        let seats_left = (i64::from(event.capacity) - seats_taken).max(0);

        Ok(EventDetails {
            event,
            organizer,
            registrations,
            seats_taken,
            seats_left,
        })
    }

    pub async fn create(
        &self,
        principal: &Principal,
        input: SchoolEventInput,
    ) -> Result<SchoolEvent, AppError> {
        principal.require(Role::Teacher)?;

        let input = input.normalized();
        input.ensure_valid()?;

        let event = self.store.insert_event(input.into_event(Uuid::new_v4())).await?;
        info!(event_id = %event.id, organizer_id = %event.organizer_id, "Event created");
        Ok(event)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        request: Versioned<SchoolEventInput>,
    ) -> Result<SchoolEvent, AppError> {
        principal.require(Role::Teacher)?;

        let input = request.data.normalized();
        input.ensure_valid()?;

        let event = self.store.update_event(id, request.version, input).await?;
        info!(event_id = %id, version = event.version, "Event updated");
        Ok(event)
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<(), AppError> {
        principal.require(Role::Teacher)?;

        self.store.delete_event(id).await?;
        info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

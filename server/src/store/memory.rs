use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{event_not_found, organizer_not_found, update_miss, SchoolStore};
use crate::models::{
    EventRegistration, Organizer, OrganizerInput, Participant, ParticipantInput,
    RegistrationEntry, RegistrationOutcome, SchoolEvent, SchoolEventInput,
};
use crate::services::guards;
use crate::services::query::EventFilter;
use crate::utils::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    organizers: HashMap<Uuid, Organizer>,
    events: HashMap<Uuid, SchoolEvent>,
    // insertion order decides which participant an email lookup finds first
    participants: Vec<Participant>,
    registrations: Vec<EventRegistration>,
}

impl Tables {
    fn sorted_events(&self, keep: impl Fn(&SchoolEvent) -> bool) -> Vec<SchoolEvent> {
        let mut events: Vec<SchoolEvent> =
            self.events.values().filter(|e| keep(e)).cloned().collect();
        events.sort_by(|a, b| a.start_at.cmp(&b.start_at).then(a.id.cmp(&b.id)));
        events
    }

    fn seats_taken(&self, event_id: Uuid) -> i64 {
        self.registrations
            .iter()
            .filter(|r| r.school_event_id == event_id)
            .count() as i64
    }

    fn entry(&self, registration: &EventRegistration) -> Option<RegistrationEntry> {
        let event = self.events.get(&registration.school_event_id)?;
        let participant = self
            .participants
            .iter()
            .find(|p| p.id == registration.participant_id)?;

        Some(RegistrationEntry {
            id: registration.id,
            registered_at: registration.registered_at,
            school_event_id: event.id,
            event_title: event.title.clone(),
            participant_id: participant.id,
            full_name: participant.full_name.clone(),
            email: participant.email.clone(),
            class_name: participant.class_name.clone(),
        })
    }
}

/// Store kept entirely in process memory. One mutex guards all tables, so
/// every operation is atomic with respect to every other.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn participant_count(&self) -> usize {
        self.tables.lock().await.participants.len()
    }

    pub async fn registration_count(&self, event_id: Uuid) -> i64 {
        self.tables.lock().await.seats_taken(event_id)
    }
}

#[async_trait]
impl SchoolStore for InMemoryStore {
    async fn list_organizers(&self) -> Result<Vec<Organizer>, AppError> {
        let tables = self.tables.lock().await;
        let mut organizers: Vec<Organizer> = tables.organizers.values().cloned().collect();
        organizers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(organizers)
    }

    async fn get_organizer(&self, id: Uuid) -> Result<Option<Organizer>, AppError> {
        Ok(self.tables.lock().await.organizers.get(&id).cloned())
    }

    async fn insert_organizer(&self, organizer: Organizer) -> Result<Organizer, AppError> {
        let mut tables = self.tables.lock().await;
        tables.organizers.insert(organizer.id, organizer.clone());
        Ok(organizer)
    }

    async fn update_organizer(
        &self,
        id: Uuid,
        expected_version: i32,
        input: OrganizerInput,
    ) -> Result<Organizer, AppError> {
        let mut tables = self.tables.lock().await;
        let stored = match tables.organizers.get_mut(&id) {
            Some(stored) if stored.version == expected_version => stored,
            Some(_) => return Err(update_miss("Organizer", id, true)),
            None => return Err(update_miss("Organizer", id, false)),
        };

        *stored = Organizer {
            version: stored.version + 1,
            ..input.into_organizer(id)
        };
        Ok(stored.clone())
    }

    async fn delete_organizer(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.organizers.contains_key(&id) {
            return Err(organizer_not_found(id));
        }

        let events = tables
            .events
            .values()
            .filter(|e| e.organizer_id == id)
            .count() as i64;
        guards::ensure_organizer_deletable(id, events)?;

        tables.organizers.remove(&id);
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<SchoolEvent>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_events(|e| filter.matches(e)))
    }

    async fn events_starting_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SchoolEvent>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.sorted_events(move |e| e.start_at >= start && e.start_at < end))
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<SchoolEvent>, AppError> {
        Ok(self.tables.lock().await.events.get(&id).cloned())
    }

    async fn insert_event(&self, event: SchoolEvent) -> Result<SchoolEvent, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.organizers.contains_key(&event.organizer_id) {
            return Err(organizer_not_found(event.organizer_id));
        }
        tables.events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        id: Uuid,
        expected_version: i32,
        input: SchoolEventInput,
    ) -> Result<SchoolEvent, AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.organizers.contains_key(&input.organizer_id) {
            return Err(organizer_not_found(input.organizer_id));
        }

        match tables.events.get(&id) {
            Some(stored) if stored.version == expected_version => {}
            Some(_) => return Err(update_miss("Event", id, true)),
            None => return Err(update_miss("Event", id, false)),
        }
        guards::ensure_capacity_covers(input.capacity, tables.seats_taken(id))?;

        let stored = tables
            .events
            .get_mut(&id)
            .ok_or_else(|| event_not_found(id))?;
        *stored = SchoolEvent {
            version: stored.version + 1,
            ..input.into_event(id)
        };
        Ok(stored.clone())
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;
        if !tables.events.contains_key(&id) {
            return Err(event_not_found(id));
        }

        guards::ensure_event_deletable(id, tables.seats_taken(id))?;

        tables.events.remove(&id);
        Ok(())
    }

    async fn register(
        &self,
        event_id: Uuid,
        participant: ParticipantInput,
        registered_at: DateTime<Utc>,
    ) -> Result<RegistrationOutcome, AppError> {
        let mut tables = self.tables.lock().await;

        let capacity = tables
            .events
            .get(&event_id)
            .map(|e| e.capacity)
            .ok_or_else(|| event_not_found(event_id))?;
        guards::ensure_seat_available(event_id, capacity, tables.seats_taken(event_id))?;

        let existing = participant.email.as_deref().and_then(|email| {
            tables
                .participants
                .iter()
                .find(|p| p.email.as_deref() == Some(email))
                .cloned()
        });

        let participant = match existing {
            Some(found) => found,
            None => {
                let fresh = participant.into_participant(Uuid::new_v4());
                tables.participants.push(fresh.clone());
                fresh
            }
        };

        let already = tables
            .registrations
            .iter()
            .any(|r| r.school_event_id == event_id && r.participant_id == participant.id);
        if already {
            return Ok(RegistrationOutcome::AlreadyRegistered { participant });
        }

        let registration = EventRegistration {
            id: Uuid::new_v4(),
            school_event_id: event_id,
            participant_id: participant.id,
            registered_at,
        };
        tables.registrations.push(registration.clone());

        Ok(RegistrationOutcome::Registered {
            registration,
            participant,
        })
    }

    async fn event_registrations(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationEntry>, AppError> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<RegistrationEntry> = tables
            .registrations
            .iter()
            .filter(|r| r.school_event_id == event_id)
            .filter_map(|r| tables.entry(r))
            .collect();
        entries.sort_by_key(|e| e.registered_at);
        Ok(entries)
    }

    async fn list_registrations(&self) -> Result<Vec<RegistrationEntry>, AppError> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<RegistrationEntry> = tables
            .registrations
            .iter()
            .filter_map(|r| tables.entry(r))
            .collect();
        entries.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(entries)
    }
}

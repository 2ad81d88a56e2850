#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDateTime;
use uuid::Uuid;

use school_events_server::auth::{Principal, Role};
use school_events_server::models::{
    EventType, Organizer, OrganizerInput, ParticipantInput, SchoolEvent, SchoolEventInput,
};
use school_events_server::services::AppState;
use school_events_server::store::InMemoryStore;

pub fn teacher() -> Principal {
    Principal::with_roles("teacher@school.com", &[Role::Teacher])
}

pub fn student() -> Principal {
    Principal::with_roles("student@school.com", &[Role::Student])
}

/// Parses `YYYY-MM-DD HH:MM`.
pub fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

pub fn participant(name: &str, email: Option<&str>) -> ParticipantInput {
    ParticipantInput {
        full_name: name.to_string(),
        email: email.map(str::to_string),
        class_name: Some("10B".to_string()),
    }
}

pub fn event_input(
    organizer_id: Uuid,
    title: &str,
    kind: EventType,
    start: &str,
    capacity: i32,
) -> SchoolEventInput {
    let start_at = at(start);
    SchoolEventInput {
        title: title.to_string(),
        description: None,
        start_at,
        end_at: start_at + chrono::Duration::hours(2),
        event_type: kind,
        location: Some("Main Hall".to_string()),
        capacity,
        organizer_id,
    }
}

pub struct Harness {
    pub store: InMemoryStore,
    pub state: AppState,
}

impl Harness {
    pub fn new() -> Self {
        let store = InMemoryStore::new();
        let state = AppState::new(Arc::new(store.clone()));
        Self { store, state }
    }

    pub async fn organizer(&self, name: &str) -> Organizer {
        self.state
            .organizers
            .create(
                &teacher(),
                OrganizerInput {
                    name: name.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    pub async fn event(
        &self,
        organizer_id: Uuid,
        title: &str,
        kind: EventType,
        start: &str,
        capacity: i32,
    ) -> SchoolEvent {
        self.state
            .events
            .create(
                &teacher(),
                event_input(organizer_id, title, kind, start, capacity),
            )
            .await
            .unwrap()
    }
}

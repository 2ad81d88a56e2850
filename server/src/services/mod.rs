pub mod events;
pub mod guards;
pub mod organizers;
pub mod query;
pub mod registration;

use std::sync::Arc;

pub use events::{EventDetails, EventService};
pub use organizers::OrganizerService;
pub use registration::RegistrationService;

use crate::store::SchoolStore;

/// Shared handler state. Clones share one store.
#[derive(Clone)]
pub struct AppState {
    pub events: EventService,
    pub organizers: OrganizerService,
    pub registrations: RegistrationService,
}

impl AppState {
    pub fn new(store: Arc<dyn SchoolStore>) -> Self {
        Self {
            events: EventService::new(store.clone()),
            organizers: OrganizerService::new(store.clone()),
            registrations: RegistrationService::new(store),
        }
    }
}

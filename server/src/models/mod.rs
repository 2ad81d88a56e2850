pub mod event;
pub mod organizer;
pub mod participant;
pub mod registration;

pub use event::{EventType, SchoolEvent, SchoolEventInput};
pub use organizer::{Organizer, OrganizerInput};
pub use participant::{Participant, ParticipantInput};
pub use registration::{EventRegistration, RegistrationEntry, RegistrationOutcome};

use serde::{Deserialize, Serialize};

/// An update payload together with the `version` the client last read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioned<T> {
    #[serde(flatten)]
    pub data: T,
    pub version: i32,
}

/// Trims surrounding whitespace; blank values collapse to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn required_text(value: String) -> String {
    value.trim().to_string()
}

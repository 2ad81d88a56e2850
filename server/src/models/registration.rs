use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Participant;

/// One participant's seat at one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct EventRegistration {
    pub id: Uuid,
    pub school_event_id: Uuid,
    pub participant_id: Uuid,
    pub registered_at: DateTime<Utc>,
}

/// A registration joined with the event title and participant data, as shown
/// in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RegistrationEntry {
    pub id: Uuid,
    pub registered_at: DateTime<Utc>,
    pub school_event_id: Uuid,
    pub event_title: String,
    pub participant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub class_name: Option<String>,
}

/// Result of a registration attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RegistrationOutcome {
    Registered {
        registration: EventRegistration,
        participant: Participant,
    },
    /// The participant already holds a seat; nothing new was recorded.
    AlreadyRegistered { participant: Participant },
}

impl RegistrationOutcome {
    pub fn participant(&self) -> &Participant {
        match self {
            RegistrationOutcome::Registered { participant, .. }
            | RegistrationOutcome::AlreadyRegistered { participant } => participant,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, RegistrationOutcome::Registered { .. })
    }
}

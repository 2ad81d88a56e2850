use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{optional_text, required_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Participant {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub class_name: Option<String>,
}

/// Registration form data. The email, when present, is the key used to find
/// an existing participant; it is compared exactly as entered (after trimming).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ParticipantInput {
    #[validate(length(
        min = 1,
        max = 120,
        message = "full name is required and at most 120 characters"
    ))]
    pub full_name: String,
    #[validate(length(max = 120, message = "email is at most 120 characters"))]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "class name is at most 20 characters"))]
    #[serde(default)]
    pub class_name: Option<String>,
}

impl ParticipantInput {
    pub fn normalized(self) -> Self {
        Self {
            full_name: required_text(self.full_name),
            email: optional_text(self.email),
            class_name: optional_text(self.class_name),
        }
    }

    pub fn into_participant(self, id: Uuid) -> Participant {
        Participant {
            id,
            full_name: self.full_name,
            email: self.email,
            class_name: self.class_name,
        }
    }
}

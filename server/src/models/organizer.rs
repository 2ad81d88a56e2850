use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{optional_text, required_text};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Organizer {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub version: i32,
}

/// Fields a teacher supplies when creating or editing an organizer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OrganizerInput {
    #[validate(length(min = 1, max = 120, message = "name is required and at most 120 characters"))]
    pub name: String,
    #[validate(length(max = 120, message = "email is at most 120 characters"))]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(max = 30, message = "phone is at most 30 characters"))]
    #[serde(default)]
    pub phone: Option<String>,
    #[validate(length(max = 200, message = "department is at most 200 characters"))]
    #[serde(default)]
    pub department: Option<String>,
}

impl OrganizerInput {
    pub fn normalized(self) -> Self {
        Self {
            name: required_text(self.name),
            email: optional_text(self.email),
            phone: optional_text(self.phone),
            department: optional_text(self.department),
        }
    }

    pub fn into_organizer(self, id: Uuid) -> Organizer {
        Organizer {
            id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            department: self.department,
            version: 1,
        }
    }
}

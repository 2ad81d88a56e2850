use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use super::{optional_text, required_text};
use crate::utils::error::AppError;

pub const DEFAULT_CAPACITY: i32 = 30;
pub const MAX_CAPACITY: i32 = 500;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "event_type", rename_all = "snake_case")]
pub enum EventType {
    Academic,
    Sports,
    Cultural,
    Excursion,
    Competition,
    #[default]
    Other,
}

impl FromStr for EventType {
    type Err = String;

    /// Accepts the variant name in any letter case, as filter forms send it.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(EventType::Academic),
            "sports" => Ok(EventType::Sports),
            "cultural" => Ok(EventType::Cultural),
            "excursion" => Ok(EventType::Excursion),
            "competition" => Ok(EventType::Competition),
            "other" => Ok(EventType::Other),
            other => Err(format!("unknown event type '{}'", other)),
        }
    }
}

/// A scheduled activity. Start and end are school wall-clock times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SchoolEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub location: Option<String>,
    pub capacity: i32,
    pub organizer_id: Uuid,
    pub version: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SchoolEventInput {
    #[validate(length(
        min = 1,
        max = 160,
        message = "title is required and at most 160 characters"
    ))]
    pub title: String,
    #[validate(length(max = 600, message = "description is at most 600 characters"))]
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    #[serde(rename = "type", default)]
    pub event_type: EventType,
    #[validate(length(max = 160, message = "location is at most 160 characters"))]
    #[serde(default)]
    pub location: Option<String>,
    #[validate(range(min = 1, max = 500, message = "capacity must be between 1 and 500"))]
    #[serde(default = "default_capacity")]
    pub capacity: i32,
    pub organizer_id: Uuid,
}

fn default_capacity() -> i32 {
    DEFAULT_CAPACITY
}

impl SchoolEventInput {
    pub fn normalized(self) -> Self {
        Self {
            title: required_text(self.title),
            description: optional_text(self.description),
            location: optional_text(self.location),
            ..self
        }
    }

    /// Field rules first, then the schedule rule, which is reported against
    /// `end_at`.
    pub fn ensure_valid(&self) -> Result<(), AppError> {
        self.validate()?;

        if self.end_at <= self.start_at {
            return Err(AppError::validation(
                "end_at",
                "the end must be after the beginning",
            ));
        }

        Ok(())
    }

    pub fn into_event(self, id: Uuid) -> SchoolEvent {
        SchoolEvent {
            id,
            title: self.title,
            description: self.description,
            start_at: self.start_at,
            end_at: self.end_at,
            event_type: self.event_type,
            location: self.location,
            capacity: self.capacity,
            organizer_id: self.organizer_id,
            version: 1,
        }
    }
}

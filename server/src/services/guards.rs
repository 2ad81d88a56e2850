//! Decisions shared by every store implementation. Stores call these while
//! holding whatever lock makes the surrounding read-then-write atomic.

use uuid::Uuid;

use crate::utils::error::AppError;

pub fn ensure_seat_available(event_id: Uuid, capacity: i32, taken: i64) -> Result<(), AppError> {
    if taken >= i64::from(capacity) {
        return Err(AppError::CapacityExceeded(format!(
            "There are no available seats for event '{}'",
            event_id
        )));
    }
    Ok(())
}

/// An event may not shrink below the seats it has already handed out.
pub fn ensure_capacity_covers(capacity: i32, taken: i64) -> Result<(), AppError> {
    if i64::from(capacity) < taken {
        return Err(AppError::validation(
            "capacity",
            format!(
                "capacity cannot be lower than the {} existing registrations",
                taken
            ),
        ));
    }
    Ok(())
}

pub fn ensure_organizer_deletable(organizer_id: Uuid, event_count: i64) -> Result<(), AppError> {
    if event_count > 0 {
        return Err(AppError::Conflict(format!(
            "Organizer '{}' has running events and cannot be deleted",
            organizer_id
        )));
    }
    Ok(())
}

pub fn ensure_event_deletable(event_id: Uuid, registration_count: i64) -> Result<(), AppError> {
    if registration_count > 0 {
        return Err(AppError::Conflict(format!(
            "Event '{}' has registrations and cannot be deleted",
            event_id
        )));
    }
    Ok(())
}

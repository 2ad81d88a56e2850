use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{event_not_found, organizer_not_found, update_miss, SchoolStore};
use crate::models::{
    EventRegistration, Organizer, OrganizerInput, Participant, ParticipantInput,
    RegistrationEntry, RegistrationOutcome, SchoolEvent, SchoolEventInput,
};
use crate::services::guards;
use crate::services::query::EventFilter;
use crate::utils::error::AppError;

const ORGANIZER_COLUMNS: &str = "id, name, email, phone, department, version";

const EVENT_COLUMNS: &str = "id, title, description, start_at, end_at, event_type, location, \
                             capacity, organizer_id, version";

const PARTICIPANT_COLUMNS: &str = "id, full_name, email, class_name";

const ENTRY_SELECT: &str = r#"
    SELECT r.id, r.registered_at, r.school_event_id, e.title AS event_title,
           r.participant_id, p.full_name, p.email, p.class_name
    FROM event_registrations r
    JOIN school_events e ON e.id = r.school_event_id
    JOIN participants p ON p.id = r.participant_id
"#;

/// PostgreSQL-backed store. Read-then-write sequences run inside a
/// transaction holding a row lock on the parent record.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `FOR SHARE` lets several events attach to one organizer at once while
/// still blocking a concurrent delete, which takes `FOR UPDATE`.
async fn lock_organizer_shared(conn: &mut PgConnection, id: Uuid) -> Result<(), AppError> {
    sqlx::query_as::<_, (Uuid,)>("SELECT id FROM organizers WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| organizer_not_found(id))
}

async fn exists(conn: &mut PgConnection, table: &str, id: Uuid) -> Result<bool, AppError> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)");
    let (found,): (bool,) = sqlx::query_as(&sql).bind(id).fetch_one(conn).await?;
    Ok(found)
}

#[async_trait]
impl SchoolStore for PgStore {
    async fn list_organizers(&self) -> Result<Vec<Organizer>, AppError> {
        let sql = format!("SELECT {ORGANIZER_COLUMNS} FROM organizers ORDER BY name");
        Ok(sqlx::query_as::<_, Organizer>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_organizer(&self, id: Uuid) -> Result<Option<Organizer>, AppError> {
        let sql = format!("SELECT {ORGANIZER_COLUMNS} FROM organizers WHERE id = $1");
        Ok(sqlx::query_as::<_, Organizer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_organizer(&self, organizer: Organizer) -> Result<Organizer, AppError> {
        let sql = format!(
            "INSERT INTO organizers ({ORGANIZER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {ORGANIZER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Organizer>(&sql)
            .bind(organizer.id)
            .bind(&organizer.name)
            .bind(&organizer.email)
            .bind(&organizer.phone)
            .bind(&organizer.department)
            .bind(organizer.version)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_organizer(
        &self,
        id: Uuid,
        expected_version: i32,
        input: OrganizerInput,
    ) -> Result<Organizer, AppError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE organizers SET name = $3, email = $4, phone = $5, department = $6, \
             version = version + 1 WHERE id = $1 AND version = $2 RETURNING {ORGANIZER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Organizer>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.department)
            .fetch_optional(&mut *tx)
            .await?;

        match updated {
            Some(organizer) => {
                tx.commit().await?;
                Ok(organizer)
            }
            None => {
                let still_exists = exists(&mut tx, "organizers", id).await?;
                Err(update_miss("Organizer", id, still_exists))
            }
        }
    }

    async fn delete_organizer(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM organizers WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| organizer_not_found(id))?;

        let (events,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM school_events WHERE organizer_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        guards::ensure_organizer_deletable(id, events)?;

        sqlx::query("DELETE FROM organizers WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_events(&self, filter: &EventFilter) -> Result<Vec<SchoolEvent>, AppError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM school_events WHERE TRUE"));

        if let Some(from) = filter.from {
            qb.push(" AND start_at::date >= ").push_bind(from);
        }
        if let Some(to) = filter.to {
            qb.push(" AND start_at::date <= ").push_bind(to);
        }
        if let Some(event_type) = filter.event_type {
            qb.push(" AND event_type = ").push_bind(event_type);
        }
        // strpos keeps the match literal and case-sensitive, unlike LIKE patterns
        if let Some(term) = filter.search_term() {
            qb.push(" AND (strpos(title, ")
                .push_bind(term.to_string())
                .push(") > 0 OR strpos(COALESCE(location, ''), ")
                .push_bind(term.to_string())
                .push(") > 0)");
        }
        qb.push(" ORDER BY start_at, id");

        Ok(qb
            .build_query_as::<SchoolEvent>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn events_starting_between(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<SchoolEvent>, AppError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM school_events \
             WHERE start_at >= $1 AND start_at < $2 ORDER BY start_at, id"
        );
        Ok(sqlx::query_as::<_, SchoolEvent>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_event(&self, id: Uuid) -> Result<Option<SchoolEvent>, AppError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM school_events WHERE id = $1");
        Ok(sqlx::query_as::<_, SchoolEvent>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_event(&self, event: SchoolEvent) -> Result<SchoolEvent, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_organizer_shared(&mut tx, event.organizer_id).await?;

        let sql = format!(
            "INSERT INTO school_events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {EVENT_COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, SchoolEvent>(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.start_at)
            .bind(event.end_at)
            .bind(event.event_type)
            .bind(&event.location)
            .bind(event.capacity)
            .bind(event.organizer_id)
            .bind(event.version)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn update_event(
        &self,
        id: Uuid,
        expected_version: i32,
        input: SchoolEventInput,
    ) -> Result<SchoolEvent, AppError> {
        let mut tx = self.pool.begin().await?;
        lock_organizer_shared(&mut tx, input.organizer_id).await?;

        // Held until commit, so no registration slips in between the count and the update.
        let current = sqlx::query_as::<_, (i32,)>(
            "SELECT version FROM school_events WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        match current {
            Some((version,)) if version == expected_version => {}
            Some(_) => return Err(update_miss("Event", id, true)),
            None => return Err(update_miss("Event", id, false)),
        }

        let (taken,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE school_event_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        guards::ensure_capacity_covers(input.capacity, taken)?;

        let sql = format!(
            "UPDATE school_events SET title = $3, description = $4, start_at = $5, end_at = $6, \
             event_type = $7, location = $8, capacity = $9, organizer_id = $10, \
             version = version + 1 WHERE id = $1 AND version = $2 RETURNING {EVENT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, SchoolEvent>(&sql)
            .bind(id)
            .bind(expected_version)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.start_at)
            .bind(input.end_at)
            .bind(input.event_type)
            .bind(&input.location)
            .bind(input.capacity)
            .bind(input.organizer_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_event(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM school_events WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| event_not_found(id))?;

        let (registrations,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE school_event_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        guards::ensure_event_deletable(id, registrations)?;

        sqlx::query("DELETE FROM school_events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn register(
        &self,
        event_id: Uuid,
        participant: ParticipantInput,
        registered_at: DateTime<Utc>,
    ) -> Result<RegistrationOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        // Serializes registrations (and deletion) of this event until commit.
        let (capacity,): (i32,) =
            sqlx::query_as("SELECT capacity FROM school_events WHERE id = $1 FOR UPDATE")
                .bind(event_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| event_not_found(event_id))?;

        let (taken,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM event_registrations WHERE school_event_id = $1")
                .bind(event_id)
                .fetch_one(&mut *tx)
                .await?;
        guards::ensure_seat_available(event_id, capacity, taken)?;

        let existing = match participant.email.as_deref() {
            Some(email) => {
                let sql = format!(
                    "SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE email = $1 \
                     ORDER BY created_at, id LIMIT 1"
                );
                sqlx::query_as::<_, Participant>(&sql)
                    .bind(email)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        let participant = match existing {
            Some(found) => found,
            None => {
                let sql = format!(
                    "INSERT INTO participants ({PARTICIPANT_COLUMNS}) VALUES ($1, $2, $3, $4) \
                     RETURNING {PARTICIPANT_COLUMNS}"
                );
                let fresh = participant.into_participant(Uuid::new_v4());
                sqlx::query_as::<_, Participant>(&sql)
                    .bind(fresh.id)
                    .bind(&fresh.full_name)
                    .bind(&fresh.email)
                    .bind(&fresh.class_name)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let (already,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM event_registrations \
             WHERE school_event_id = $1 AND participant_id = $2)",
        )
        .bind(event_id)
        .bind(participant.id)
        .fetch_one(&mut *tx)
        .await?;

        if already {
            debug!(%event_id, participant_id = %participant.id, "Participant already holds a seat");
            tx.commit().await?;
            return Ok(RegistrationOutcome::AlreadyRegistered { participant });
        }

        let registration = sqlx::query_as::<_, EventRegistration>(
            "INSERT INTO event_registrations (id, school_event_id, participant_id, registered_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, school_event_id, participant_id, registered_at",
        )
        .bind(Uuid::new_v4())
        .bind(event_id)
        .bind(participant.id)
        .bind(registered_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RegistrationOutcome::Registered {
            registration,
            participant,
        })
    }

    async fn event_registrations(
        &self,
        event_id: Uuid,
    ) -> Result<Vec<RegistrationEntry>, AppError> {
        let sql = format!("{ENTRY_SELECT} WHERE r.school_event_id = $1 ORDER BY r.registered_at");
        Ok(sqlx::query_as::<_, RegistrationEntry>(&sql)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_registrations(&self) -> Result<Vec<RegistrationEntry>, AppError> {
        let sql = format!("{ENTRY_SELECT} ORDER BY r.registered_at DESC");
        Ok(sqlx::query_as::<_, RegistrationEntry>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }
}

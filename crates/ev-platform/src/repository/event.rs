//! Event Repository

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::db::Database;
use crate::domain::{unique_ids, Event, EventDraft};
use crate::error::{PlatformError, Result};

#[derive(sqlx::FromRow)]
struct EventRow {
    event_id: i64,
    title: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    location: String,
    image: Option<Vec<u8>>,
    category_id: Option<i64>,
    capacity: i64,
    is_archived: bool,
    price: i64,
    created_at: DateTime<Utc>,
}

impl EventRow {
    fn into_event(self, booked_users: Vec<i64>) -> Event {
        Event {
            event_id: self.event_id,
            title: self.title,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            image: self.image,
            category_id: self.category_id,
            capacity: self.capacity,
            is_archived: self.is_archived,
            price: self.price,
            booked_users: unique_ids(booked_users),
            created_at: self.created_at,
        }
    }
}

const EVENT_COLUMNS: &str = "event_id, title, start_date, end_date, location, image, \
     category_id, capacity, is_archived, price, created_at";

/// Load one event with its bookings on a specific connection.
///
/// Used both for plain reads and inside the booking transaction.
pub(crate) async fn fetch_event(
    conn: &mut SqliteConnection,
    event_id: i64,
) -> Result<Option<Event>> {
    let sql = format!("SELECT {} FROM events WHERE event_id = ?", EVENT_COLUMNS);
    let row: Option<EventRow> = sqlx::query_as(&sql)
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let booked: Vec<i64> = sqlx::query_scalar(
        "SELECT user_id FROM bookings WHERE event_id = ? ORDER BY rowid",
    )
    .bind(event_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(row.into_event(booked)))
}

pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    pub async fn insert(&self, draft: &EventDraft) -> Result<Event> {
        let result = sqlx::query(
            r#"
            INSERT INTO events
                (title, start_date, end_date, location, image, category_id, capacity, is_archived, price, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.title)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.location)
        .bind(&draft.image)
        .bind(draft.category_id)
        .bind(draft.capacity)
        .bind(draft.is_archived)
        .bind(draft.price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::internal(format!("event {} vanished after insert", id)))
    }

    pub async fn find_by_id(&self, event_id: i64) -> Result<Option<Event>> {
        let mut conn = self.pool.acquire().await?;
        fetch_event(&mut conn, event_id).await
    }

    pub async fn find_all(&self) -> Result<Vec<Event>> {
        let sql = format!("SELECT {} FROM events ORDER BY event_id", EVENT_COLUMNS);
        let rows: Vec<EventRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await?;

        let pairs: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT event_id, user_id FROM bookings ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<i64, Vec<i64>> = HashMap::new();
        for (event_id, user_id) in pairs {
            by_event.entry(event_id).or_default().push(user_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let users = by_event.remove(&row.event_id).unwrap_or_default();
                row.into_event(users)
            })
            .collect())
    }

    /// Overwrite all writable columns.
    ///
    /// False when no event matched or when the new capacity is below the
    /// bookings already held; the guard runs in the same statement.
    pub async fn update(&self, event_id: i64, draft: &EventDraft) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE events SET
                title = ?, start_date = ?, end_date = ?, location = ?, image = ?,
                category_id = ?, capacity = ?, is_archived = ?, price = ?
            WHERE event_id = ?
              AND (SELECT COUNT(*) FROM bookings WHERE bookings.event_id = events.event_id) <= ?
            "#,
        )
        .bind(&draft.title)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(&draft.location)
        .bind(&draft.image)
        .bind(draft.category_id)
        .bind(draft.capacity)
        .bind(draft.is_archived)
        .bind(draft.price)
        .bind(event_id)
        .bind(draft.capacity)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, event_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE event_id = ?")
            .bind(event_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! User Repository

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::db::Database;
use crate::domain::{unique_ids, NewUser, User, UserChanges};
use crate::error::{is_unique_violation, PlatformError, Result};

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    password_hash: String,
    name: String,
    is_guest: bool,
    balance: i64,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, event_ids: Vec<i64>) -> User {
        User {
            user_id: self.user_id,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            is_guest: self.is_guest,
            balance: self.balance,
            event_ids: unique_ids(event_ids),
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "user_id, email, password_hash, name, is_guest, balance, created_at";

pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }

    pub async fn insert(&self, user: &NewUser) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, name, is_guest, balance, created_at) \
             VALUES (?, ?, ?, ?, 0, ?)",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.is_guest)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, &user.email))?;

        let id = result.last_insert_rowid();
        self.find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::internal(format!("user {} vanished after insert", id)))
    }

    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE user_id = ?", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let event_ids = self.event_ids(user_id).await?;
                Ok(Some(row.into_user(event_ids)))
            }
            None => Ok(None),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let event_ids = self.event_ids(row.user_id).await?;
                Ok(Some(row.into_user(event_ids)))
            }
            None => Ok(None),
        }
    }

    /// Accepted (non-guest) users.
    pub async fn find_members(&self) -> Result<Vec<User>> {
        self.find_by_guest_flag(false).await
    }

    pub async fn find_guests(&self) -> Result<Vec<User>> {
        self.find_by_guest_flag(true).await
    }

    async fn find_by_guest_flag(&self, is_guest: bool) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE is_guest = ? ORDER BY user_id",
            USER_COLUMNS
        ))
        .bind(is_guest)
        .fetch_all(&self.pool)
        .await?;

        let pairs: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT user_id, event_id FROM bookings ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_user: HashMap<i64, Vec<i64>> = HashMap::new();
        for (user_id, event_id) in pairs {
            by_user.entry(user_id).or_default().push(event_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let ids = by_user.remove(&row.user_id).unwrap_or_default();
                row.into_user(ids)
            })
            .collect())
    }

    /// Events booked by a user, in booking order.
    pub async fn event_ids(&self, user_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT event_id FROM bookings WHERE user_id = ? ORDER BY rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(unique_ids(ids))
    }

    /// Booked events that end after `today`.
    pub async fn upcoming_event_ids(&self, user_id: i64, today: NaiveDate) -> Result<Vec<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT b.event_id FROM bookings b
            JOIN events e ON e.event_id = b.event_id
            WHERE b.user_id = ? AND e.end_date > ?
            ORDER BY b.rowid
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(unique_ids(ids))
    }

    /// Returns false when no user matched.
    pub async fn update(&self, user_id: i64, changes: &UserChanges) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE(?, email),
                password_hash = COALESCE(?, password_hash),
                name = COALESCE(?, name)
            WHERE user_id = ?
            "#,
        )
        .bind(&changes.email)
        .bind(&changes.password_hash)
        .bind(&changes.name)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, changes.email.as_deref().unwrap_or_default()))?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Promote a guest to member.
    pub async fn accept_guest(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET is_guest = 0 WHERE user_id = ? AND is_guest = 1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_guest(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = ? AND is_guest = 1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Credit a user's balance; returns the new balance, or None when no user matched.
    ///
    /// A result outside the `i64` range is rejected and nothing is written.
    pub async fn add_balance(&self, user_id: i64, amount: i64) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        // No-op write first so the read below holds the write lock.
        let current: Option<i64> = sqlx::query_scalar(
            "UPDATE users SET balance = balance WHERE user_id = ? RETURNING balance",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(current) = current else {
            return Ok(None);
        };

        let balance = current.checked_add(amount).ok_or_else(|| {
            PlatformError::validation("top-up would take the balance out of range")
        })?;

        sqlx::query("UPDATE users SET balance = ? WHERE user_id = ?")
            .bind(balance)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(balance))
    }
}

fn map_email_conflict(err: sqlx::Error, email: &str) -> PlatformError {
    if is_unique_violation(&err) {
        PlatformError::duplicate("User", "email", email)
    } else {
        err.into()
    }
}

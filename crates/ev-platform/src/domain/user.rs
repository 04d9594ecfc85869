//! User Entity
//!
//! Members and guests share one table; a guest is a registered account
//! that a back-office operator has not yet accepted.

use chrono::{DateTime, Utc};

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_guest: bool,
    pub balance: i64,
    /// Booked events, unique, in booking order
    pub event_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub is_guest: bool,
}

impl NewUser {
    pub fn guest(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            is_guest: true,
        }
    }
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none() && self.name.is_none()
    }
}

pub fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid || email.chars().any(char::is_whitespace) {
        return Err(PlatformError::validation(format!("Invalid email address: {}", email)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("ana@example").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana example@x.com").is_err());
        assert!(validate_email("ana@.com").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_new_guest() {
        let user = NewUser::guest("a@b.co", "hash", "Ana");
        assert!(user.is_guest);
    }

    #[test]
    fn test_empty_changes() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges { name: Some("Bo".into()), ..Default::default() };
        assert!(!changes.is_empty());
    }
}

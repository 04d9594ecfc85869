//! Event Entity

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub image: Option<Vec<u8>>,
    pub category_id: Option<i64>,
    pub capacity: i64,
    pub is_archived: bool,
    pub price: i64,
    /// Users holding a booking, unique, in booking order
    pub booked_users: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.booked_users.len() as i64 >= self.capacity
    }

    pub fn has_booked(&self, user_id: i64) -> bool {
        self.booked_users.contains(&user_id)
    }

    pub fn remaining_seats(&self) -> i64 {
        (self.capacity - self.booked_users.len() as i64).max(0)
    }

    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.clone(),
            image: self.image.clone(),
            category_id: self.category_id,
            capacity: self.capacity,
            is_archived: self.is_archived,
            price: self.price,
        }
    }
}

/// Writable columns of an event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    pub image: Option<Vec<u8>>,
    pub category_id: Option<i64>,
    pub capacity: i64,
    pub is_archived: bool,
    pub price: i64,
}

impl EventDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(PlatformError::validation("title is required"));
        }
        if self.location.trim().is_empty() {
            return Err(PlatformError::validation("location is required"));
        }
        if self.capacity < 0 {
            return Err(PlatformError::validation("capacity must not be negative"));
        }
        if self.price < 0 {
            return Err(PlatformError::validation("price must not be negative"));
        }
        if self.end_date < self.start_date {
            return Err(PlatformError::validation(format!(
                "end_date {} is before start_date {}",
                self.end_date, self.start_date
            )));
        }
        Ok(())
    }
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub image: Option<Vec<u8>>,
    pub category_id: Option<i64>,
    pub capacity: Option<i64>,
    pub is_archived: Option<bool>,
    pub price: Option<i64>,
}

impl EventChanges {
    pub fn apply(self, draft: &mut EventDraft) {
        if let Some(v) = self.title {
            draft.title = v;
        }
        if let Some(v) = self.start_date {
            draft.start_date = v;
        }
        if let Some(v) = self.end_date {
            draft.end_date = v;
        }
        if let Some(v) = self.location {
            draft.location = v;
        }
        if let Some(v) = self.image {
            draft.image = Some(v);
        }
        if let Some(v) = self.category_id {
            draft.category_id = Some(v);
        }
        if let Some(v) = self.capacity {
            draft.capacity = v;
        }
        if let Some(v) = self.is_archived {
            draft.is_archived = v;
        }
        if let Some(v) = self.price {
            draft.price = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft() -> EventDraft {
        EventDraft {
            title: "Jazz Night".into(),
            start_date: date("2026-06-01"),
            end_date: date("2026-06-02"),
            location: "Main Hall".into(),
            image: None,
            category_id: None,
            capacity: 2,
            is_archived: false,
            price: 30,
        }
    }

    fn event(capacity: i64, booked: Vec<i64>) -> Event {
        let d = draft();
        Event {
            event_id: 1,
            title: d.title,
            start_date: d.start_date,
            end_date: d.end_date,
            location: d.location,
            image: None,
            category_id: None,
            capacity,
            is_archived: false,
            price: d.price,
            booked_users: booked,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut d = draft();
        d.capacity = -1;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.price = -5;
        assert!(d.validate().is_err());

        let mut d = draft();
        d.end_date = date("2026-05-31");
        assert!(d.validate().is_err());

        let mut d = draft();
        d.title = "  ".into();
        assert!(d.validate().is_err());
    }

    #[test]
    fn test_single_day_event_is_valid() {
        let mut d = draft();
        d.end_date = d.start_date;
        assert!(d.validate().is_ok());
    }

    #[test]
    fn test_capacity_checks() {
        let e = event(2, vec![7]);
        assert!(!e.is_full());
        assert!(e.has_booked(7));
        assert!(!e.has_booked(8));
        assert_eq!(e.remaining_seats(), 1);

        assert!(event(1, vec![7]).is_full());
        assert!(event(0, vec![]).is_full());
    }

    #[test]
    fn test_changes_apply_only_present_fields() {
        let mut d = draft();
        EventChanges {
            price: Some(45),
            is_archived: Some(true),
            ..Default::default()
        }
        .apply(&mut d);

        assert_eq!(d.price, 45);
        assert!(d.is_archived);
        assert_eq!(d.title, "Jazz Night");
        assert_eq!(d.capacity, 2);
    }
}

//! Booking Coordinator
//!
//! Books a user onto an event as one atomic state transition: the
//! capacity and duplicate checks, the booking row (which is both the
//! event's participant entry and the user's event entry) and the balance
//! debit commit together or not at all.

use ev_config::BalancePolicy;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::domain::BookingReceipt;
use crate::error::{PlatformError, Result};
use crate::repository::event::fetch_event;

pub struct BookingCoordinator {
    pool: SqlitePool,
    policy: BalancePolicy,
}

impl BookingCoordinator {
    pub fn new(db: &Database, policy: BalancePolicy) -> Self {
        Self {
            pool: db.pool().clone(),
            policy,
        }
    }

    pub async fn book_event(&self, event_id: i64, user_id: i64) -> Result<BookingReceipt> {
        debug!(event_id, user_id, "Booking event");
        let mut tx = self.pool.begin().await?;

        // Writing first takes the database write lock, so no concurrent
        // booking can change the rows read below before commit.
        let locked = sqlx::query("UPDATE events SET capacity = capacity WHERE event_id = ?")
            .bind(event_id)
            .execute(&mut *tx)
            .await?;
        if locked.rows_affected() == 0 {
            warn!(event_id, user_id, "Booking rejected: event not found");
            return Err(PlatformError::not_found("Event", event_id));
        }

        let event = fetch_event(&mut tx, event_id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Event", event_id))?;

        if event.has_booked(user_id) {
            warn!(event_id, user_id, "Booking rejected: already booked");
            return Err(PlatformError::AlreadyBooked { event_id, user_id });
        }

        if event.is_full() {
            warn!(event_id, user_id, capacity = event.capacity, "Booking rejected: event full");
            return Err(PlatformError::EventFull {
                event_id,
                capacity: event.capacity,
            });
        }

        // The user reference is checked at commit, so a missing user
        // surfaces below and the whole transaction rolls back.
        sqlx::query("INSERT INTO bookings (event_id, user_id, booked_at) VALUES (?, ?, ?)")
            .bind(event_id)
            .bind(user_id)
            .bind(chrono::Utc::now())
            .execute(&mut *tx)
            .await?;

        let balance: i64 = sqlx::query_scalar("SELECT balance FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                warn!(event_id, user_id, "Booking rejected: user not found");
                PlatformError::not_found("User", user_id)
            })?;

        if self.policy == BalancePolicy::RequireFunds && balance < event.price {
            warn!(
                event_id,
                user_id,
                balance,
                price = event.price,
                "Booking rejected: insufficient funds"
            );
            return Err(PlatformError::InsufficientFunds {
                balance,
                price: event.price,
            });
        }

        let balance_after = balance.checked_sub(event.price).ok_or_else(|| {
            warn!(
                event_id,
                user_id,
                balance,
                price = event.price,
                "Booking rejected: balance out of range"
            );
            PlatformError::validation("booking would take the balance out of range")
        })?;

        let debit = sqlx::query("UPDATE users SET balance = ? WHERE user_id = ?")
            .bind(balance_after)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let receipt = BookingReceipt {
            event_id,
            user_id,
            price: event.price,
            balance_after,
            rows_affected: debit.rows_affected(),
        };
        tx.commit().await?;

        info!(
            event_id,
            user_id,
            price = receipt.price,
            balance_after = receipt.balance_after,
            "Event booked"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventDraft, NewUser};
    use crate::repository::{EventRepository, UserRepository};
    use chrono::NaiveDate;

    struct Fixture {
        db: Database,
        events: EventRepository,
        users: UserRepository,
    }

    async fn fixture() -> Fixture {
        let db = Database::in_memory().await.unwrap();
        Fixture {
            events: EventRepository::new(&db),
            users: UserRepository::new(&db),
            db,
        }
    }

    impl Fixture {
        async fn event(&self, capacity: i64, price: i64) -> i64 {
            let draft = EventDraft {
                title: "Concert".into(),
                start_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2030, 1, 2).unwrap(),
                location: "Arena".into(),
                image: None,
                category_id: None,
                capacity,
                is_archived: false,
                price,
            };
            self.events.insert(&draft).await.unwrap().event_id
        }

        async fn user(&self, email: &str, balance: i64) -> i64 {
            let user = self.users.insert(&NewUser::guest(email, "hash", "Test")).await.unwrap();
            if balance != 0 {
                self.users.add_balance(user.user_id, balance).await.unwrap();
            }
            user.user_id
        }

        fn coordinator(&self, policy: BalancePolicy) -> BookingCoordinator {
            BookingCoordinator::new(&self.db, policy)
        }
    }

    #[tokio::test]
    async fn test_book_debits_balance_and_links_both_sides() {
        let f = fixture().await;
        let event_id = f.event(10, 30).await;
        let user_id = f.user("a@example.com", 100).await;

        let receipt = f

            .coordinator(BalancePolicy::AllowNegative)

            .book_event(event_id, user_id)

            .await

            .unwrap();

        assert_eq!(receipt.price, 30);
        assert_eq!(receipt.balance_after, 70);
        assert_eq!(receipt.rows_affected, 1);

        let user = f.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, 70);
        assert_eq!(user.event_ids, vec![event_id]);

        let event = f.events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.booked_users, vec![user_id]);
    }

    #[tokio::test]
    async fn test_second_booking_is_rejected_without_changes() {
        let f = fixture().await;
        let event_id = f.event(10, 30).await;
        let user_id = f.user("a@example.com", 100).await;
        let coordinator = f.coordinator(BalancePolicy::AllowNegative);

        coordinator.book_event(event_id, user_id).await.unwrap();
        let err = coordinator.book_event(event_id, user_id).await.unwrap_err();

        assert!(matches!(err, PlatformError::AlreadyBooked { .. }));
        let user = f.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, 70);
        assert_eq!(user.event_ids, vec![event_id]);
    }

    #[tokio::test]
    async fn test_full_event() {
        let f = fixture().await;
        let event_id = f.event(1, 0).await;
        let a = f.user("a@example.com", 0).await;
        let b = f.user("b@example.com", 0).await;
        let coordinator = f.coordinator(BalancePolicy::AllowNegative);

        coordinator.book_event(event_id, a).await.unwrap();
        let err = coordinator.book_event(event_id, b).await.unwrap_err();

        assert!(matches!(err, PlatformError::EventFull { capacity: 1, .. }));
        let event = f.events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.booked_users, vec![a]);
    }

    #[tokio::test]
    async fn test_zero_capacity_event_is_always_full() {
        let f = fixture().await;
        let event_id = f.event(0, 0).await;
        let a = f.user("a@example.com", 0).await;

        let err = f

            .coordinator(BalancePolicy::AllowNegative)

            .book_event(event_id, a)

            .await

            .unwrap_err();
        assert!(matches!(err, PlatformError::EventFull { .. }));
    }

    #[tokio::test]
    async fn test_missing_event() {
        let f = fixture().await;
        let user_id = f.user("a@example.com", 50).await;

        let err = f

            .coordinator(BalancePolicy::AllowNegative)

            .book_event(999, user_id)

            .await

            .unwrap_err();

        assert!(
            matches!(err, PlatformError::NotFound { ref entity_type, .. } if entity_type == "Event")
        );
        let user = f.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, 50);
        assert!(user.event_ids.is_empty());
    }

    #[tokio::test]
    async fn test_missing_user_rolls_back_booking_row() {
        let f = fixture().await;
        let event_id = f.event(5, 10).await;

        let err = f

            .coordinator(BalancePolicy::AllowNegative)

            .book_event(event_id, 4242)

            .await

            .unwrap_err();

        assert!(
            matches!(err, PlatformError::NotFound { ref entity_type, .. } if entity_type == "User")
        );
        let event = f.events.find_by_id(event_id).await.unwrap().unwrap();
        assert!(event.booked_users.is_empty());
    }

    #[tokio::test]
    async fn test_allow_negative_balance() {
        let f = fixture().await;
        let event_id = f.event(5, 30).await;
        let user_id = f.user("a@example.com", 10).await;

        let receipt = f

            .coordinator(BalancePolicy::AllowNegative)

            .book_event(event_id, user_id)

            .await

            .unwrap();
        assert_eq!(receipt.balance_after, -20);
    }

    #[tokio::test]
    async fn test_require_funds_rejects_without_changes() {
        let f = fixture().await;
        let event_id = f.event(5, 30).await;
        let user_id = f.user("a@example.com", 10).await;

        let err = f

            .coordinator(BalancePolicy::RequireFunds)

            .book_event(event_id, user_id)

            .await

            .unwrap_err();

        assert!(matches!(err, PlatformError::InsufficientFunds { balance: 10, price: 30 }));
        let user = f.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, 10);
        assert!(user.event_ids.is_empty());
        let event = f.events.find_by_id(event_id).await.unwrap().unwrap();
        assert!(event.booked_users.is_empty());
    }

    #[tokio::test]
    async fn test_require_funds_allows_exact_balance() {
        let f = fixture().await;
        let event_id = f.event(5, 30).await;
        let user_id = f.user("a@example.com", 30).await;

        let receipt = f

            .coordinator(BalancePolicy::RequireFunds)

            .book_event(event_id, user_id)

            .await

            .unwrap();
        assert_eq!(receipt.balance_after, 0);
    }

    #[tokio::test]
    async fn test_debit_out_of_range_rolls_back() {
        let f = fixture().await;
        let first = f.event(5, 1).await;
        let second = f.event(5, 1).await;
        let costly = f.event(5, i64::MAX).await;
        let user_id = f.user("a@example.com", 0).await;
        let coordinator = f.coordinator(BalancePolicy::AllowNegative);

        coordinator.book_event(first, user_id).await.unwrap();
        coordinator.book_event(second, user_id).await.unwrap();
        let err = coordinator.book_event(costly, user_id).await.unwrap_err();

        assert!(matches!(err, PlatformError::Validation { .. }));
        let user = f.users.find_by_id(user_id).await.unwrap().unwrap();
        assert_eq!(user.balance, -2);
        assert_eq!(user.event_ids, vec![first, second]);
        let event = f.events.find_by_id(costly).await.unwrap().unwrap();
        assert!(event.booked_users.is_empty());
    }
}

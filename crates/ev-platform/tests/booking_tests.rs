//! Booking coordinator against a file-backed database with a
//! multi-connection pool, so bookings race on real SQLite locks.

use std::sync::Arc;

use chrono::NaiveDate;
use ev_config::{BalancePolicy, DatabaseConfig};
use ev_platform::domain::{EventDraft, NewUser};
use ev_platform::repository::{EventRepository, UserRepository};
use ev_platform::service::BookingCoordinator;
use ev_platform::{Database, PlatformError};
use futures::future::join_all;
use tempfile::TempDir;

async fn file_database(dir: &TempDir) -> Database {
    let config = DatabaseConfig {
        url: format!("sqlite://{}", dir.path().join("bookings.db").display()),
        max_connections: 4,
        busy_timeout_ms: 10_000,
    };
    let db = Database::connect(&config).await.unwrap();
    db.init_schema().await.unwrap();
    db
}

fn draft(capacity: i64, price: i64) -> EventDraft {
    EventDraft {
        title: "Night Run".to_string(),
        start_date: NaiveDate::from_ymd_opt(2099, 9, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2099, 9, 1).unwrap(),
        location: "Harbour".to_string(),
        image: None,
        category_id: None,
        capacity,
        is_archived: false,
        price,
    }
}

async fn seed_users(db: &Database, count: usize, balance: i64) -> Vec<i64> {
    let repo = UserRepository::new(db);
    let mut ids = Vec::with_capacity(count);
    for i in 0..count {
        let user = repo
            .insert(&NewUser::guest(format!("runner{}@example.com", i), "hash", "Runner"))
            .await
            .unwrap();
        repo.accept_guest(user.user_id).await.unwrap();
        repo.add_balance(user.user_id, balance).await.unwrap();
        ids.push(user.user_id);
    }
    ids
}

#[tokio::test]
async fn test_concurrent_bookings_respect_capacity() {
    let dir = TempDir::new().unwrap();
    let db = file_database(&dir).await;
    let event = EventRepository::new(&db).insert(&draft(5, 10)).await.unwrap();
    let users = seed_users(&db, 12, 25).await;

    let coordinator = Arc::new(BookingCoordinator::new(&db, BalancePolicy::AllowNegative));
    let attempts = users.iter().map(|&user_id| {
        let coordinator = coordinator.clone();
        let event_id = event.event_id;
        tokio::spawn(async move { (user_id, coordinator.book_event(event_id, user_id).await) })
    });

    let mut booked = Vec::new();
    for result in join_all(attempts).await {
        let (user_id, outcome) = result.unwrap();
        match outcome {
            Ok(receipt) => {
                assert_eq!(receipt.balance_after, 15);
                booked.push(user_id);
            }
            Err(PlatformError::EventFull { .. }) => {}
            Err(other) => panic!("unexpected booking error: {other}"),
        }
    }
    assert_eq!(booked.len(), 5);

    let stored = EventRepository::new(&db).find_by_id(event.event_id).await.unwrap().unwrap();
    let mut participants = stored.booked_users.clone();
    participants.sort_unstable();
    booked.sort_unstable();
    assert_eq!(participants, booked);

    let repo = UserRepository::new(&db);
    for user_id in users {
        let user = repo.find_by_id(user_id).await.unwrap().unwrap();
        if booked.contains(&user_id) {
            assert_eq!(user.balance, 15);
            assert_eq!(user.event_ids, vec![event.event_id]);
        } else {
            assert_eq!(user.balance, 25);
            assert!(user.event_ids.is_empty());
        }
    }
}

#[tokio::test]
async fn test_same_user_racing_books_once() {
    let dir = TempDir::new().unwrap();
    let db = file_database(&dir).await;
    let event = EventRepository::new(&db).insert(&draft(10, 40)).await.unwrap();
    let user_id = seed_users(&db, 1, 100).await[0];

    let coordinator = Arc::new(BookingCoordinator::new(&db, BalancePolicy::AllowNegative));
    let attempts = (0..6).map(|_| {
        let coordinator = coordinator.clone();
        let event_id = event.event_id;
        tokio::spawn(async move { coordinator.book_event(event_id, user_id).await })
    });

    let outcomes: Vec<_> = join_all(attempts).await.into_iter().map(|r| r.unwrap()).collect();
    let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(succeeded, 1);
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|e| matches!(e, PlatformError::AlreadyBooked { .. })));

    let user = UserRepository::new(&db).find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(user.balance, 60);
    assert_eq!(user.event_ids, vec![event.event_id]);
}

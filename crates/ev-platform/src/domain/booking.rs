//! Booking Entities

use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

/// Outcome of a committed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BookingReceipt {
    pub event_id: i64,
    pub user_id: i64,
    /// Amount debited from the user's balance
    pub price: i64,
    pub balance_after: i64,
    /// Rows touched by the balance debit
    pub rows_affected: u64,
}

/// Drop repeated ids, keeping first-seen order.
pub fn unique_ids(ids: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_keeps_order() {
        assert_eq!(unique_ids([3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(unique_ids(Vec::new()).is_empty());
    }
}

//! Domain Models
//!
//! Core entities for the event platform.

pub mod booking;
pub mod category;
pub mod event;
pub mod image;
pub mod user;

pub use booking::{unique_ids, BookingReceipt};
pub use category::Category;
pub use event::{Event, EventChanges, EventDraft};
pub use user::{validate_email, NewUser, User, UserChanges};

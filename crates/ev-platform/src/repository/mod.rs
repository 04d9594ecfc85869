//! Repository Layer
//!
//! SQLite data access for platform entities.

pub mod category;
pub mod event;
pub mod user;

pub use category::CategoryRepository;
pub use event::EventRepository;
pub use user::UserRepository;

//! Eventy Platform
//!
//! Event management backend providing:
//! - Members, guests and guest approval
//! - Event categories and events with capacity and pricing
//! - Transactional event booking with balance debit
//! - Payment intent creation with an external processor
//! - Back-office token authentication

pub mod api;
pub mod db;
pub mod domain;
pub mod error;
pub mod repository;
pub mod service;

pub use db::Database;
pub use domain::*;
pub use error::PlatformError;

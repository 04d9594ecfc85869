//! Service Layer
//!
//! Booking coordination, authentication and payment integration.

pub mod auth;
pub mod booking;
pub mod password;
pub mod payment;

pub use auth::{extract_bearer_token, AuthService, Claims, ROLE_ADMIN, ROLE_USER};
pub use booking::BookingCoordinator;
pub use password::PasswordService;
pub use payment::{PaymentGateway, PaymentIntent, PaymentIntentRequest, StripeGateway};

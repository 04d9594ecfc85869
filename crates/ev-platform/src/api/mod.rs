//! API Layer
//!
//! REST endpoints for the platform.
//! `/backoffice` serves administration, `/mobile` serves the end-user app.

use axum::{http::Uri, Router};
use ev_config::AppConfig;
use std::sync::Arc;

use crate::db::Database;
use crate::error::PlatformError;
use crate::repository::{CategoryRepository, EventRepository, UserRepository};
use crate::service::{AuthService, BookingCoordinator, PasswordService, PaymentGateway};

pub mod common;
pub mod middleware;

// Back office
pub mod auth;
pub mod categories;
pub mod events;
pub mod users;

// Mobile
pub mod bookings;
pub mod mobile;

pub mod openapi;

pub use common::*;
pub use middleware::{require_admin, BackofficeAuthState};

pub use auth::{token_router, TokenState};
pub use bookings::{bookings_router, BookingsState};
pub use categories::{categories_read_router, categories_router, CategoriesState};
pub use events::{events_read_router, events_router, EventsState};
pub use mobile::{mobile_router, MobileState};
pub use openapi::EventyApiDoc;
pub use users::{users_router, UsersState};

/// Assemble the `/backoffice` and `/mobile` routers over one database.
pub fn platform_router(
    db: &Database,
    config: &AppConfig,
    payments: Arc<dyn PaymentGateway>,
) -> Router {
    let user_repo = Arc::new(UserRepository::new(db));
    let event_repo = Arc::new(EventRepository::new(db));
    let category_repo = Arc::new(CategoryRepository::new(db));

    let auth_service = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiry_hours,
    ));
    let password_service = Arc::new(PasswordService::default());
    let booking = Arc::new(BookingCoordinator::new(db, config.booking.balance_policy));

    let users_state = UsersState { user_repo, password_service };
    let categories_state = CategoriesState { category_repo: category_repo.clone() };
    let events_state = EventsState { event_repo, category_repo };
    let token_state = TokenState {
        auth_service: auth_service.clone(),
        admin: Arc::new(config.admin.clone()),
    };
    let guard = BackofficeAuthState {
        auth_service: auth_service.clone(),
        enabled: config.auth.protect_backoffice,
    };
    let mobile_state = MobileState {
        users: users_state.clone(),
        auth_service,
    };
    let bookings_state = BookingsState {
        booking,
        payments,
        currency: config.payments.currency.clone(),
    };

    let backoffice = Router::new()
        .merge(users_router(users_state))
        .merge(categories_router(categories_state.clone()))
        .merge(events_router(events_state.clone()))
        .route_layer(axum::middleware::from_fn_with_state(guard, require_admin))
        .merge(token_router(token_state));

    let mobile = Router::new()
        .merge(events_read_router(events_state))
        .merge(categories_read_router(categories_state))
        .merge(mobile_router(mobile_state))
        .merge(bookings_router(bookings_state));

    Router::new()
        .nest("/backoffice", backoffice)
        .nest("/mobile", mobile)
        .fallback(route_not_found)
}

async fn route_not_found(uri: Uri) -> PlatformError {
    PlatformError::not_found("Route", uri.path())
}

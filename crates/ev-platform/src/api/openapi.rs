//! OpenAPI Documentation
//!
//! Central OpenAPI document for the back-office and mobile APIs.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Eventy API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Eventy API",
        version = "1.0.0",
        description = "Event management back office and mobile app APIs"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "backoffice-auth", description = "Back-office authentication"),
        (name = "users", description = "Member management"),
        (name = "guests", description = "Guest approval"),
        (name = "categories", description = "Event categories"),
        (name = "events", description = "Event management"),
        (name = "mobile", description = "Mobile app accounts"),
        (name = "bookings", description = "Bookings and payments")
    ),
    paths(
        // Back office
        super::auth::issue_token,
        super::users::get_users,
        super::users::add_user,
        super::users::update_user,
        super::users::delete_user,
        super::users::get_guests,
        super::users::accept_guest,
        super::users::decline_guest,
        super::categories::get_categories,
        super::categories::add_category,
        super::categories::update_category,
        super::categories::delete_category,
        super::events::get_events,
        super::events::add_event,
        super::events::update_event,
        super::events::delete_event,
        // Mobile
        super::mobile::login,
        super::mobile::register,
        super::mobile::update_profile,
        super::mobile::get_profile,
        super::mobile::topup_balance,
        super::events::mobile_get_events,
        super::categories::mobile_get_categories,
        super::bookings::book_event,
        super::bookings::pay,
    ),
    components(
        schemas(
            super::common::ApiResponse,
            super::common::CreatedResponse,
            super::auth::TokenRequest,
            super::auth::TokenResponse,
            super::users::AddUserRequest,
            super::users::UpdateUserRequest,
            super::users::UserResponse,
            super::categories::CategoryRequest,
            super::categories::CategoryResponse,
            super::events::CreateEventRequest,
            super::events::UpdateEventRequest,
            super::events::EventResponse,
            super::mobile::LoginRequest,
            super::mobile::LoginResponse,
            super::mobile::TopupResponse,
            super::bookings::BookEventRequest,
            super::bookings::BookingResponse,
            super::bookings::PayRequest,
            super::bookings::PayResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct EventyApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_reads_are_documented() {
        let doc = serde_json::to_value(EventyApiDoc::openapi()).unwrap();
        let paths = &doc["paths"];

        for path in ["/mobile/get_events", "/mobile/get_categories"] {
            let op = &paths[path]["get"];
            assert!(op.is_object(), "{path} missing from the document");
            assert_eq!(op["tags"][0], "mobile");
            assert!(op.get("security").is_none());
        }
    }

    #[test]
    fn test_backoffice_reads_require_bearer() {
        let doc = serde_json::to_value(EventyApiDoc::openapi()).unwrap();

        for path in ["/backoffice/get_events", "/backoffice/get_categories"] {
            let security = &doc["paths"][path]["get"]["security"];
            assert!(security[0].get("bearer_auth").is_some(), "{path} lacks bearer_auth");
        }
    }
}

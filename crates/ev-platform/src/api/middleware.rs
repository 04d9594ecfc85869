//! API Middleware
//!
//! Bearer-token guard for the back-office routes.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::PlatformError;
use crate::service::{extract_bearer_token, AuthService, ROLE_ADMIN};

#[derive(Clone)]
pub struct BackofficeAuthState {
    pub auth_service: Arc<AuthService>,
    /// When false every request passes through
    pub enabled: bool,
}

/// Requires an unexpired admin token on every request.
pub async fn require_admin(
    State(state): State<BackofficeAuthState>,
    request: Request,
    next: Next,
) -> Result<Response, PlatformError> {
    if !state.enabled {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PlatformError::unauthorized("Missing Authorization header"))?;

    let token = extract_bearer_token(header)
        .ok_or_else(|| PlatformError::unauthorized("Invalid Authorization header format"))?;

    let claims = state.auth_service.validate_token(token).map_err(|e| {
        warn!(path = %request.uri().path(), "Back-office token rejected");
        e
    })?;

    if claims.role != ROLE_ADMIN {
        warn!(subject = %claims.sub, role = %claims.role, "Back-office access without admin role");
        return Err(PlatformError::unauthorized("Admin role required"));
    }

    debug!(subject = %claims.sub, "Back-office request authorized");
    Ok(next.run(request).await)
}

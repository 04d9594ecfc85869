//! Back-office Auth API
//!
//! Exchanges the configured admin credentials for a bearer token.

use axum::{extract::State, routing::post, Json, Router};
use ev_config::AdminConfig;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::api::common::{ApiResponse, ValidJson};
use crate::error::PlatformError;
use crate::service::{AuthService, ROLE_ADMIN};

#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct TokenState {
    pub auth_service: Arc<AuthService>,
    pub admin: Arc<AdminConfig>,
}

/// Issue a back-office token
#[utoipa::path(
    post,
    path = "/backoffice/token",
    tag = "backoffice-auth",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ApiResponse)
    )
)]
pub async fn issue_token(
    State(state): State<TokenState>,
    ValidJson(req): ValidJson<TokenRequest>,
) -> Result<Json<TokenResponse>, PlatformError> {
    if req.username != state.admin.username || req.password != state.admin.password {
        warn!(username = %req.username, "Back-office login failed");
        return Err(PlatformError::InvalidCredentials);
    }

    let access_token = state.auth_service.issue_token(&req.username, ROLE_ADMIN)?;
    info!(username = %req.username, "Back-office token issued");

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_service.expiry_seconds(),
    }))
}

pub fn token_router(state: TokenState) -> Router {
    Router::new()
        .route("/token", post(issue_token))
        .with_state(state)
}

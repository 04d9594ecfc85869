//! Mobile Account API
//!
//! Registration, login, profile and balance top-up for app users.

use axum::{
    extract::State,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::api::common::{ApiResponse, CreatedResponse, ValidJson, ValidQuery, SUCCESS_CODE};
use crate::api::users::{AddUserRequest, UpdateUserRequest, UserResponse, UsersState};
use crate::error::{PlatformError, Result};
use crate::service::{AuthService, ROLE_USER};

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub code: i32,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileQuery {
    pub user_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TopupQuery {
    pub user_id: i64,
    /// Amount to add, must be positive
    pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TopupResponse {
    pub success: bool,
    pub message: String,
    pub code: i32,
    /// Balance after the top-up
    pub balance: i64,
}

#[derive(Clone)]
pub struct MobileState {
    pub users: UsersState,
    pub auth_service: Arc<AuthService>,
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/mobile/login",
    tag = "mobile",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiResponse),
        (status = 403, description = "Account awaiting approval", body = ApiResponse)
    )
)]
pub async fn login(
    State(state): State<MobileState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = req.email.trim().to_lowercase();
    let user = state.users.user_repo.find_by_email(&email).await?;

    let password_service = &state.users.password_service;
    let Some(user) = user.filter(|u| password_service.verify(&req.password, &u.password_hash)) else {
        warn!(email = %email, "Login failed");
        return Err(PlatformError::InvalidCredentials);
    };

    if user.is_guest {
        warn!(user_id = user.user_id, "Login attempt by guest awaiting approval");
        return Err(PlatformError::AccountPending);
    }

    let token = state.auth_service.issue_token(&user.user_id.to_string(), ROLE_USER)?;
    info!(user_id = user.user_id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        code: SUCCESS_CODE,
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_service.expiry_seconds(),
    }))
}

/// Register a new account; it stays a guest until accepted
#[utoipa::path(
    post,
    path = "/mobile/register",
    tag = "mobile",
    request_body = AddUserRequest,
    responses(
        (status = 200, description = "Registered", body = CreatedResponse),
        (status = 400, description = "Validation error", body = ApiResponse),
        (status = 409, description = "Email already registered", body = ApiResponse)
    )
)]
pub async fn register(
    State(state): State<MobileState>,
    ValidJson(req): ValidJson<AddUserRequest>,
) -> Result<Json<CreatedResponse>> {
    let user = state.users.create_guest(req).await?;
    Ok(Json(CreatedResponse::new("Register successful", user.user_id)))
}

/// Update own profile
#[utoipa::path(
    put,
    path = "/mobile/update_profile",
    tag = "mobile",
    params(ProfileQuery),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn update_profile(
    State(state): State<MobileState>,
    ValidQuery(query): ValidQuery<ProfileQuery>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse>> {
    state.users.apply_update(query.user_id, req).await?;
    Ok(Json(ApiResponse::ok("User updated successfully")))
}

/// Fetch own profile with upcoming bookings
#[utoipa::path(
    get,
    path = "/mobile/get_profile",
    tag = "mobile",
    params(ProfileQuery),
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn get_profile(
    State(state): State<MobileState>,
    ValidQuery(query): ValidQuery<ProfileQuery>,
) -> Result<Json<UserResponse>> {
    Ok(Json(state.users.member_profile(query.user_id).await?))
}

/// Add credit to a user's balance
#[utoipa::path(
    put,
    path = "/mobile/topup_balance",
    tag = "mobile",
    params(TopupQuery),
    responses(
        (status = 200, description = "Balance updated", body = TopupResponse),
        (status = 400, description = "Amount not positive", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    )
)]
pub async fn topup_balance(
    State(state): State<MobileState>,
    ValidQuery(query): ValidQuery<TopupQuery>,
) -> Result<Json<TopupResponse>> {
    if query.balance <= 0 {
        return Err(PlatformError::validation("balance must be a positive amount"));
    }

    let balance = state
        .users
        .user_repo
        .add_balance(query.user_id, query.balance)
        .await?
        .ok_or_else(|| PlatformError::not_found("User", query.user_id))?;
    info!(user_id = query.user_id, amount = query.balance, balance, "Balance topped up");

    Ok(Json(TopupResponse {
        success: true,
        message: "Balance updated successfully".to_string(),
        code: SUCCESS_CODE,
        balance,
    }))
}

/// Create mobile account router
pub fn mobile_router(state: MobileState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/update_profile", put(update_profile))
        .route("/get_profile", get(get_profile))
        .route("/topup_balance", put(topup_balance))
        .with_state(state)
}

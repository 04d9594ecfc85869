//! Users Admin API
//!
//! Back-office member management plus the guest approval queue.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::api::common::{
    optional, required, ApiResponse, CreatedResponse, ValidJson, ValidPath, ValidQuery,
};
use crate::domain::{validate_email, NewUser, User, UserChanges};
use crate::error::{PlatformError, Result};
use crate::repository::UserRepository;
use crate::service::PasswordService;

/// Create user request; new users start as guests
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddUserRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Partial user update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub user_id: i64,
    pub email: String,
    pub name: String,
    pub is_guest: bool,
    pub balance: i64,
    pub event_ids: Vec<i64>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            name: u.name,
            is_guest: u.is_guest,
            balance: u.balance,
            event_ids: u.event_ids,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserIdQuery {
    /// Return a single member instead of the full list
    pub user_id: Option<i64>,
}

/// Users service state
#[derive(Clone)]
pub struct UsersState {
    pub user_repo: Arc<UserRepository>,
    pub password_service: Arc<PasswordService>,
}

impl UsersState {
    /// Insert a guest account after validating the request.
    pub(crate) async fn create_guest(&self, req: AddUserRequest) -> Result<User> {
        let email = req.email.trim().to_lowercase();
        validate_email(&email)?;
        let name = required("name", &req.name)?;
        let password_hash = self.password_service.hash(&req.password)?;

        let user = self.user_repo.insert(&NewUser::guest(email, password_hash, name)).await?;
        info!(user_id = user.user_id, email = %user.email, "Guest user created");
        Ok(user)
    }

    pub(crate) async fn apply_update(&self, user_id: i64, req: UpdateUserRequest) -> Result<()> {
        let email = optional("email", req.email)?.map(|e| e.to_lowercase());
        if let Some(ref email) = email {
            validate_email(email)?;
        }
        let password_hash = match req.password {
            Some(ref password) => Some(self.password_service.hash(password)?),
            None => None,
        };
        let changes = UserChanges {
            email,
            password_hash,
            name: optional("name", req.name)?,
        };
        if changes.is_empty() {
            return Err(PlatformError::validation("No fields to update"));
        }

        if !self.user_repo.update(user_id, &changes).await? {
            return Err(PlatformError::not_found("User", user_id));
        }
        info!(user_id, "User updated");
        Ok(())
    }

    /// A member with only the bookings for events that have not ended.
    pub(crate) async fn member_profile(&self, user_id: i64) -> Result<UserResponse> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .filter(|u| !u.is_guest)
            .ok_or_else(|| PlatformError::not_found("User", user_id))?;

        user.event_ids = self.user_repo.upcoming_event_ids(user_id, Utc::now().date_naive()).await?;
        Ok(user.into())
    }
}

/// List members, or fetch one by id
#[utoipa::path(
    get,
    path = "/backoffice/get_users",
    tag = "users",
    params(UserIdQuery),
    responses(
        (
            status = 200,
            description = "Member list, or a single member when user_id is given",
            body = Vec<UserResponse>
        ),
        (status = 404, description = "Member not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_users(
    State(state): State<UsersState>,
    ValidQuery(query): ValidQuery<UserIdQuery>,
) -> Result<Response> {
    if let Some(user_id) = query.user_id {
        debug!(user_id, "Get member by id");
        return Ok(Json(state.member_profile(user_id).await?).into_response());
    }

    let users: Vec<UserResponse> = state
        .user_repo
        .find_members()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    debug!(count = users.len(), "Listed members");
    Ok(Json(users).into_response())
}

/// Add a user (created as a guest awaiting approval)
#[utoipa::path(
    post,
    path = "/backoffice/add_user",
    tag = "users",
    request_body = AddUserRequest,
    responses(
        (status = 200, description = "User created", body = CreatedResponse),
        (status = 400, description = "Validation error", body = ApiResponse),
        (status = 409, description = "Email already registered", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_user(
    State(state): State<UsersState>,
    ValidJson(req): ValidJson<AddUserRequest>,
) -> Result<Json<CreatedResponse>> {
    let user = state.create_guest(req).await?;
    Ok(Json(CreatedResponse::new("User added successfully", user.user_id)))
}

/// Update user fields
#[utoipa::path(
    put,
    path = "/backoffice/update_user/{user_id}",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(state): State<UsersState>,
    ValidPath(user_id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse>> {
    state.apply_update(user_id, req).await?;
    Ok(Json(ApiResponse::ok("User updated successfully")))
}

/// Delete a user and their bookings
#[utoipa::path(
    delete,
    path = "/backoffice/delete_user/{user_id}",
    tag = "users",
    params(("user_id" = i64, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted", body = ApiResponse),
        (status = 404, description = "User not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(state): State<UsersState>,
    ValidPath(user_id): ValidPath<i64>,
) -> Result<Json<ApiResponse>> {
    if !state.user_repo.delete(user_id).await? {
        return Err(PlatformError::not_found("User", user_id));
    }
    info!(user_id, "User deleted");
    Ok(Json(ApiResponse::ok("User deleted successfully")))
}

/// List guests awaiting approval
#[utoipa::path(
    get,
    path = "/backoffice/get_guests",
    tag = "guests",
    responses((status = 200, description = "Guest list", body = Vec<UserResponse>)),
    security(("bearer_auth" = []))
)]
pub async fn get_guests(State(state): State<UsersState>) -> Result<Json<Vec<UserResponse>>> {
    let guests = state
        .user_repo
        .find_guests()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(guests))
}

/// Accept a guest, turning them into a member
#[utoipa::path(
    post,
    path = "/backoffice/accept_guest/{user_id}",
    tag = "guests",
    params(("user_id" = i64, Path, description = "Guest user ID")),
    responses(
        (status = 200, description = "Guest accepted", body = ApiResponse),
        (status = 404, description = "Guest not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn accept_guest(
    State(state): State<UsersState>,
    ValidPath(user_id): ValidPath<i64>,
) -> Result<Json<ApiResponse>> {
    if !state.user_repo.accept_guest(user_id).await? {
        return Err(PlatformError::not_found("Guest", user_id));
    }
    info!(user_id, "Guest accepted");
    Ok(Json(ApiResponse::ok("Guest accepted successfully")))
}

/// Decline a guest, deleting the account
#[utoipa::path(
    post,
    path = "/backoffice/decline_guest/{user_id}",
    tag = "guests",
    params(("user_id" = i64, Path, description = "Guest user ID")),
    responses(
        (status = 200, description = "Guest declined", body = ApiResponse),
        (status = 404, description = "Guest not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn decline_guest(
    State(state): State<UsersState>,
    ValidPath(user_id): ValidPath<i64>,
) -> Result<Json<ApiResponse>> {
    if !state.user_repo.delete_guest(user_id).await? {
        return Err(PlatformError::not_found("Guest", user_id));
    }
    info!(user_id, "Guest declined");
    Ok(Json(ApiResponse::ok("Guest declined successfully")))
}

/// Create users router (back office)
pub fn users_router(state: UsersState) -> Router {
    Router::new()
        .route("/get_users", get(get_users))
        .route("/add_user", post(add_user))
        .route("/update_user/:user_id", put(update_user))
        .route("/delete_user/:user_id", delete(delete_user))
        .route("/get_guests", get(get_guests))
        .route("/accept_guest/:user_id", post(accept_guest))
        .route("/decline_guest/:user_id", post(decline_guest))
        .with_state(state)
}

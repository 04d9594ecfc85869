//! Categories API

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::api::common::{ApiResponse, CreatedResponse, ValidJson, ValidPath, ValidQuery};
use crate::domain::category::normalize_name;
use crate::domain::Category;
use crate::error::{PlatformError, Result};
use crate::repository::CategoryRepository;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub category_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub category_id: i64,
    pub category_name: String,
}

impl From<Category> for CategoryResponse {
    fn from(c: Category) -> Self {
        Self {
            category_id: c.category_id,
            category_name: c.category_name,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryIdQuery {
    pub category_id: Option<i64>,
}

#[derive(Clone)]
pub struct CategoriesState {
    pub category_repo: Arc<CategoryRepository>,
}

/// List categories, or fetch one by id
#[utoipa::path(
    get,
    path = "/backoffice/get_categories",
    tag = "categories",
    params(CategoryIdQuery),
    responses(
        (
            status = 200,
            description = "Category list, or one category when category_id is given",
            body = Vec<CategoryResponse>
        ),
        (status = 404, description = "Category not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_categories(
    State(state): State<CategoriesState>,
    ValidQuery(query): ValidQuery<CategoryIdQuery>,
) -> Result<Response> {
    if let Some(id) = query.category_id {
        let category = state
            .category_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Category", id))?;
        return Ok(Json(CategoryResponse::from(category)).into_response());
    }

    let categories: Vec<CategoryResponse> = state
        .category_repo
        .find_all()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(categories).into_response())
}

/// Add a category
#[utoipa::path(
    post,
    path = "/backoffice/add_category",
    tag = "categories",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category created", body = CreatedResponse),
        (status = 409, description = "Name already used", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_category(
    State(state): State<CategoriesState>,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> Result<Json<CreatedResponse>> {
    let name = normalize_name(&req.category_name)?;
    let category = state.category_repo.insert(&name).await?;
    info!(category_id = category.category_id, name = %category.category_name, "Category created");
    Ok(Json(CreatedResponse::new("Category added successfully", category.category_id)))
}

/// Rename a category
#[utoipa::path(
    put,
    path = "/backoffice/update_category/{category_id}",
    tag = "categories",
    params(("category_id" = i64, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse),
        (status = 404, description = "Category not found", body = ApiResponse),
        (status = 409, description = "Name already used", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<CategoriesState>,
    ValidPath(category_id): ValidPath<i64>,
    ValidJson(req): ValidJson<CategoryRequest>,
) -> Result<Json<ApiResponse>> {
    let name = normalize_name(&req.category_name)?;
    if !state.category_repo.rename(category_id, &name).await? {
        return Err(PlatformError::not_found("Category", category_id));
    }
    info!(category_id, name = %name, "Category updated");
    Ok(Json(ApiResponse::ok("Category updated successfully")))
}

/// Delete a category; its events become uncategorized
#[utoipa::path(
    delete,
    path = "/backoffice/delete_category/{category_id}",
    tag = "categories",
    params(("category_id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = ApiResponse),
        (status = 404, description = "Category not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<CategoriesState>,
    ValidPath(category_id): ValidPath<i64>,
) -> Result<Json<ApiResponse>> {
    if !state.category_repo.delete(category_id).await? {
        return Err(PlatformError::not_found("Category", category_id));
    }
    info!(category_id, "Category deleted");
    Ok(Json(ApiResponse::ok("Category deleted successfully")))
}

/// Create categories router (back office)
pub fn categories_router(state: CategoriesState) -> Router {
    Router::new()
        .route("/get_categories", get(get_categories))
        .route("/add_category", post(add_category))
        .route("/update_category/:category_id", put(update_category))
        .route("/delete_category/:category_id", delete(delete_category))
        .with_state(state)
}

/// List categories for the mobile app, or fetch one by id
#[utoipa::path(
    get,
    path = "/mobile/get_categories",
    tag = "mobile",
    params(CategoryIdQuery),
    responses(
        (
            status = 200,
            description = "Category list, or one category when category_id is given",
            body = Vec<CategoryResponse>
        ),
        (status = 404, description = "Category not found", body = ApiResponse)
    )
)]
pub async fn mobile_get_categories(
    state: State<CategoriesState>,
    query: ValidQuery<CategoryIdQuery>,
) -> Result<Response> {
    get_categories(state, query).await
}

/// Read-only categories router (mobile)
pub fn categories_read_router(state: CategoriesState) -> Router {
    Router::new()
        .route("/get_categories", get(mobile_get_categories))
        .with_state(state)
}

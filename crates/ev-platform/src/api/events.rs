//! Events API
//!
//! Back-office event management and the read-only catalogue served to
//! the mobile app.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::api::common::{
    optional, required, ApiResponse, CreatedResponse, ValidJson, ValidPath, ValidQuery,
};
use crate::domain::{image, Event, EventChanges, EventDraft};
use crate::error::{PlatformError, Result};
use crate::repository::{CategoryRepository, EventRepository};

/// Create event request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub title: String,
    /// YYYY-MM-DD
    pub start_date: NaiveDate,
    /// YYYY-MM-DD, not before start_date
    pub end_date: NaiveDate,
    pub location: String,
    /// Base64 payload or `data:` URL (PNG, JPEG, GIF, SVG)
    pub image: Option<String>,
    #[serde(alias = "category")]
    pub category_id: Option<i64>,
    pub capacity: i64,
    #[serde(default, alias = "isArchived")]
    pub is_archived: bool,
    #[serde(default)]
    pub price: i64,
}

/// Partial event update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub image: Option<String>,
    #[serde(alias = "category")]
    pub category_id: Option<i64>,
    pub capacity: Option<i64>,
    #[serde(alias = "isArchived")]
    pub is_archived: Option<bool>,
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub event_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub location: String,
    /// `data:` URL
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub capacity: i64,
    pub is_archived: bool,
    pub price: i64,
    pub booked_users: Vec<i64>,
    pub remaining_seats: i64,
    pub created_at: String,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        let remaining_seats = e.remaining_seats();
        Self {
            event_id: e.event_id,
            title: e.title,
            start_date: e.start_date,
            end_date: e.end_date,
            location: e.location,
            image: e.image.as_deref().map(image::to_data_url),
            category_id: e.category_id,
            capacity: e.capacity,
            is_archived: e.is_archived,
            price: e.price,
            booked_users: e.booked_users,
            remaining_seats,
            created_at: e.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventIdQuery {
    pub event_id: Option<i64>,
}

#[derive(Clone)]
pub struct EventsState {
    pub event_repo: Arc<EventRepository>,
    pub category_repo: Arc<CategoryRepository>,
}

impl EventsState {
    async fn ensure_category(&self, category_id: Option<i64>) -> Result<()> {
        if let Some(id) = category_id {
            if !self.category_repo.exists(id).await? {
                return Err(PlatformError::not_found("Category", id));
            }
        }
        Ok(())
    }
}

fn decode_image(image: Option<String>) -> Result<Option<Vec<u8>>> {
    match image {
        Some(ref data) if !data.trim().is_empty() => Ok(Some(image::decode(data)?)),
        _ => Ok(None),
    }
}

/// List events, or fetch one by id
#[utoipa::path(
    get,
    path = "/backoffice/get_events",
    tag = "events",
    params(EventIdQuery),
    responses(
        (
            status = 200,
            description = "Event list, or one event when event_id is given",
            body = Vec<EventResponse>
        ),
        (status = 404, description = "Event not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_events(
    State(state): State<EventsState>,
    ValidQuery(query): ValidQuery<EventIdQuery>,
) -> Result<Response> {
    if let Some(id) = query.event_id {
        debug!(event_id = id, "Get event by id");
        let event = state
            .event_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Event", id))?;
        return Ok(Json(EventResponse::from(event)).into_response());
    }

    let events: Vec<EventResponse> = state
        .event_repo
        .find_all()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(events).into_response())
}

/// Add an event
#[utoipa::path(
    post,
    path = "/backoffice/add_event",
    tag = "events",
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = CreatedResponse),
        (status = 400, description = "Validation error", body = ApiResponse),
        (status = 404, description = "Category not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_event(
    State(state): State<EventsState>,
    ValidJson(req): ValidJson<CreateEventRequest>,
) -> Result<Json<CreatedResponse>> {
    let draft = EventDraft {
        title: required("title", &req.title)?,
        start_date: req.start_date,
        end_date: req.end_date,
        location: required("location", &req.location)?,
        image: decode_image(req.image)?,
        category_id: req.category_id,
        capacity: req.capacity,
        is_archived: req.is_archived,
        price: req.price,
    };
    draft.validate()?;
    state.ensure_category(draft.category_id).await?;

    let event = state.event_repo.insert(&draft).await?;
    info!(
        event_id = event.event_id,
        title = %event.title,
        capacity = event.capacity,
        "Event created"
    );
    Ok(Json(CreatedResponse::new("Event added successfully", event.event_id)))
}

/// Update event fields
#[utoipa::path(
    put,
    path = "/backoffice/update_event/{event_id}",
    tag = "events",
    params(("event_id" = i64, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse),
        (status = 400, description = "Validation error", body = ApiResponse),
        (status = 404, description = "Event or category not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_event(
    State(state): State<EventsState>,
    ValidPath(event_id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateEventRequest>,
) -> Result<Json<ApiResponse>> {
    let existing = state
        .event_repo
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| PlatformError::not_found("Event", event_id))?;

    let changes = EventChanges {
        title: optional("title", req.title)?,
        start_date: req.start_date,
        end_date: req.end_date,
        location: optional("location", req.location)?,
        image: decode_image(req.image)?,
        category_id: req.category_id,
        capacity: req.capacity,
        is_archived: req.is_archived,
        price: req.price,
    };
    if changes.category_id.is_some() {
        state.ensure_category(changes.category_id).await?;
    }

    let mut draft = existing.to_draft();
    changes.apply(&mut draft);
    draft.validate()?;

    let booked = existing.booked_users.len() as i64;
    if draft.capacity < booked {
        return Err(PlatformError::validation(format!(
            "capacity {} is below the {} existing bookings",
            draft.capacity, booked
        )));
    }

    if !state.event_repo.update(event_id, &draft).await? {
        // Deleted or booked past the new capacity since the read above
        return match state.event_repo.find_by_id(event_id).await? {
            Some(_) => Err(PlatformError::validation(
                "capacity is below the number of existing bookings",
            )),
            None => Err(PlatformError::not_found("Event", event_id)),
        };
    }

    info!(event_id, "Event updated");
    Ok(Json(ApiResponse::ok("Event updated successfully")))
}

/// Delete an event and its bookings
#[utoipa::path(
    delete,
    path = "/backoffice/delete_event/{event_id}",
    tag = "events",
    params(("event_id" = i64, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted", body = ApiResponse),
        (status = 404, description = "Event not found", body = ApiResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_event(
    State(state): State<EventsState>,
    ValidPath(event_id): ValidPath<i64>,
) -> Result<Json<ApiResponse>> {
    if !state.event_repo.delete(event_id).await? {
        return Err(PlatformError::not_found("Event", event_id));
    }
    info!(event_id, "Event deleted");
    Ok(Json(ApiResponse::ok("Event deleted successfully")))
}

/// Create events router (back office)
pub fn events_router(state: EventsState) -> Router {
    Router::new()
        .route("/get_events", get(get_events))
        .route("/add_event", post(add_event))
        .route("/update_event/:event_id", put(update_event))
        .route("/delete_event/:event_id", delete(delete_event))
        .with_state(state)
}

/// List events for the mobile app, or fetch one by id
#[utoipa::path(
    get,
    path = "/mobile/get_events",
    tag = "mobile",
    params(EventIdQuery),
    responses(
        (
            status = 200,
            description = "Event list, or one event when event_id is given",
            body = Vec<EventResponse>
        ),
        (status = 404, description = "Event not found", body = ApiResponse)
    )
)]
pub async fn mobile_get_events(
    state: State<EventsState>,
    query: ValidQuery<EventIdQuery>,
) -> Result<Response> {
    get_events(state, query).await
}

/// Read-only events router (mobile)
pub fn events_read_router(state: EventsState) -> Router {
    Router::new()
        .route("/get_events", get(mobile_get_events))
        .with_state(state)
}

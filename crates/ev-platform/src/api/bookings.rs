//! Bookings and Payments API

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::common::{ApiResponse, ValidJson, SUCCESS_CODE};
use crate::error::{PlatformError, Result};
use crate::service::{BookingCoordinator, PaymentGateway, PaymentIntentRequest};

#[derive(Debug, Deserialize, ToSchema)]
pub struct BookEventRequest {
    pub event_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub success: bool,
    pub message: String,
    pub code: i32,
    pub event_id: i64,
    pub user_id: i64,
    pub price: i64,
    /// Balance after the debit
    pub balance: i64,
    pub rows_affected: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PayRequest {
    pub event_id: i64,
    /// Smallest currency unit
    pub price: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PayResponse {
    pub client_secret: String,
    pub payment_intent_id: String,
    pub event_id: i64,
    pub user_id: i64,
}

#[derive(Clone)]
pub struct BookingsState {
    pub booking: Arc<BookingCoordinator>,
    pub payments: Arc<dyn PaymentGateway>,
    pub currency: String,
}

/// Book a seat at an event, debiting the event price
#[utoipa::path(
    post,
    path = "/mobile/book-event",
    tag = "bookings",
    request_body = BookEventRequest,
    responses(
        (status = 200, description = "Booked", body = BookingResponse),
        (status = 402, description = "Insufficient balance", body = ApiResponse),
        (status = 404, description = "Event or user not found", body = ApiResponse),
        (status = 409, description = "Already booked or event full", body = ApiResponse)
    )
)]
pub async fn book_event(
    State(state): State<BookingsState>,
    ValidJson(req): ValidJson<BookEventRequest>,
) -> Result<Json<BookingResponse>> {
    let receipt = state.booking.book_event(req.event_id, req.user_id).await?;

    Ok(Json(BookingResponse {
        success: true,
        message: "Event booked successfully".to_string(),
        code: SUCCESS_CODE,
        event_id: receipt.event_id,
        user_id: receipt.user_id,
        price: receipt.price,
        balance: receipt.balance_after,
        rows_affected: receipt.rows_affected,
    }))
}

/// Create a payment intent for an event
#[utoipa::path(
    post,
    path = "/mobile/pay",
    tag = "bookings",
    request_body = PayRequest,
    responses(
        (status = 200, description = "Payment intent created", body = PayResponse),
        (status = 400, description = "Invalid amount", body = ApiResponse),
        (status = 502, description = "Payment provider error", body = ApiResponse)
    )
)]
pub async fn pay(
    State(state): State<BookingsState>,
    ValidJson(req): ValidJson<PayRequest>,
) -> Result<Json<PayResponse>> {
    if req.price <= 0 {
        return Err(PlatformError::validation("price must be a positive amount"));
    }

    let intent = state
        .payments
        .create_payment_intent(&PaymentIntentRequest {
            amount: req.price,
            currency: state.currency.clone(),
            event_id: req.event_id,
            user_id: req.user_id,
        })
        .await?;

    Ok(Json(PayResponse {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
        event_id: req.event_id,
        user_id: req.user_id,
    }))
}

/// Create bookings router (mobile)
pub fn bookings_router(state: BookingsState) -> Router {
    Router::new()
        .route("/book-event", post(book_event))
        .route("/pay", post(pay))
        .with_state(state)
}

//! Platform Error Types

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::api::common::ApiResponse;

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("{entity_type} not found with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{entity_type} with {field}={value} already exists")]
    Duplicate { entity_type: String, field: String, value: String },

    #[error("User {user_id} has already booked event {event_id}")]
    AlreadyBooked { event_id: i64, user_id: i64 },

    #[error("Event {event_id} is full (capacity {capacity})")]
    EventFull { event_id: i64, capacity: i64 },

    #[error("Insufficient balance: {balance} available, {price} required")]
    InsufficientFunds { balance: i64, price: i64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is awaiting approval")]
    AccountPending,

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Payment gateway error: {message}")]
    PaymentGateway { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(
        entity_type: impl Into<String>,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Duplicate {
            entity_type: entity_type.into(),
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn payment_gateway(message: impl Into<String>) -> Self {
        Self::PaymentGateway { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Numeric code carried in the response envelope.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidCredentials => -1,
            Self::AccountPending => -2,
            Self::Unauthorized { .. } => -3,
            Self::AlreadyBooked { .. } => -6,
            Self::EventFull { .. } => -7,
            Self::InsufficientFunds { .. } => -8,
            Self::Validation { .. } => -400,
            Self::NotFound { .. } => -404,
            Self::Duplicate { .. } => -409,
            Self::PaymentGateway { .. } => -502,
            Self::Database(_) | Self::Internal { .. } => -500,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::AccountPending => StatusCode::FORBIDDEN,
            Self::AlreadyBooked { .. } | Self::EventFull { .. } | Self::Duplicate { .. } => {
                StatusCode::CONFLICT
            }
            Self::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::PaymentGateway { .. } => StatusCode::BAD_GATEWAY,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// True when a write failed on a UNIQUE or PRIMARY KEY constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Database(e) => {
                error!(error = %e, "Database error");
                "Internal server error".to_string()
            }
            Self::Internal { message } => {
                error!(error = %message, "Internal error");
                "Internal server error".to_string()
            }
            Self::PaymentGateway { message } => {
                warn!(error = %message, "Payment gateway failure");
                self.to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ApiResponse::failure(message, self.code()))).into_response()
    }
}

impl From<JsonRejection> for PlatformError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("Invalid request payload: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for PlatformError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for PlatformError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(format!("Invalid query parameter: {}", rejection.body_text()))
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

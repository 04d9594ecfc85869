//! Common API types and utilities

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PlatformError;

pub const SUCCESS_CODE: i32 = 200;

/// Standard envelope for mutations and failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    pub code: i32,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: SUCCESS_CODE,
        }
    }

    pub fn failure(message: impl Into<String>, code: i32) -> Self {
        Self {
            success: false,
            message: message.into(),
            code,
        }
    }
}

/// Envelope for inserts, carrying the new row id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    pub success: bool,
    pub message: String,
    pub code: i32,
    pub id: i64,
}

impl CreatedResponse {
    pub fn new(message: impl Into<String>, id: i64) -> Self {
        Self {
            success: true,
            message: message.into(),
            code: SUCCESS_CODE,
            id,
        }
    }
}

/// JSON body extractor that rejects with the standard envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PlatformError))]
pub struct ValidJson<T>(pub T);

/// Path extractor that rejects with the standard envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PlatformError))]
pub struct ValidPath<T>(pub T);

/// Query extractor that rejects with the standard envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(PlatformError))]
pub struct ValidQuery<T>(pub T);

/// Trimmed, non-empty required text field.
pub fn required(field: &str, value: &str) -> Result<String, PlatformError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PlatformError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trim an optional text field, rejecting values that trim to nothing.
pub fn optional(field: &str, value: Option<String>) -> Result<Option<String>, PlatformError> {
    value.map(|v| required(field, &v)).transpose()
}

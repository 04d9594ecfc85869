//! Category Entity

use serde::Serialize;

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
}

/// Trimmed category name, rejecting blanks.
pub fn normalize_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(PlatformError::validation("category_name is required"));
    }
    Ok(name.to_string())
}

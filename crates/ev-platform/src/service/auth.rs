//! Authentication Service
//!
//! HS256 JWT issuance and validation.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username for the back office, user id for mobile users
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl AuthService {
    pub fn new(secret: &str, expiry_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue_token(&self, subject: &str, role: &str) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            role: role.to_string(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Failed to sign token: {}", e)))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => PlatformError::unauthorized("Token expired"),
                _ => PlatformError::unauthorized("Invalid token"),
            })
    }

    pub fn expiry_seconds(&self) -> i64 {
        self.expiry.num_seconds()
    }
}

/// Token part of an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_validate() {
        let auth = AuthService::new("secret", 1);
        let token = auth.issue_token("admin", ROLE_ADMIN).unwrap();

        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, ROLE_ADMIN);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = AuthService::new("one", 1).issue_token("admin", ROLE_ADMIN).unwrap();
        let err = AuthService::new("two", 1).validate_token(&token).unwrap_err();
        assert!(matches!(err, PlatformError::Unauthorized { .. }));
    }

    #[test]
    fn test_expired_token() {
        let auth = AuthService::new("secret", -2);
        let token = auth.issue_token("admin", ROLE_ADMIN).unwrap();
        let err = auth.validate_token(&token).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized: Token expired");
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Bearer  "), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }
}

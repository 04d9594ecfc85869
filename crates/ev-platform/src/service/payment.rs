//! Payment Gateway
//!
//! Creates payment intents with an external processor. Intents are not
//! reconciled with bookings.

use async_trait::async_trait;
use ev_config::PaymentsConfig;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{PlatformError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Smallest currency unit
    pub amount: i64,
    pub currency: String,
    pub event_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent>;
}

/// Stripe REST client (`POST /v1/payment_intents`).
pub struct StripeGateway {
    client: Client,
    api_base: String,
    secret_key: String,
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(config: &PaymentsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| PlatformError::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(&self, request: &PaymentIntentRequest) -> Result<PaymentIntent> {
        if self.secret_key.is_empty() {
            return Err(PlatformError::payment_gateway("Payment provider is not configured"));
        }

        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
            ("metadata[event_id]", request.event_id.to_string()),
        ];

        debug!(amount = request.amount, user_id = request.user_id, "Creating payment intent");
        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PlatformError::payment_gateway(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| status.to_string());
            return Err(PlatformError::payment_gateway(detail));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PlatformError::payment_gateway(format!("unexpected response: {}", e)))?;

        info!(
            intent_id = %intent.id,
            event_id = request.event_id,
            user_id = request.user_id,
            "Payment intent created"
        );
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(api_base: &str, key: &str) -> PaymentsConfig {
        PaymentsConfig {
            stripe_secret_key: key.to_string(),
            api_base: api_base.to_string(),
            currency: "usd".to_string(),
        }
    }

    fn request() -> PaymentIntentRequest {
        PaymentIntentRequest {
            amount: 2500,
            currency: "usd".to_string(),
            event_id: 3,
            user_id: 7,
        }
    }

    #[tokio::test]
    async fn test_creates_intent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .and(header("authorization", "Bearer sk_test_123"))
            .and(body_string_contains("amount=2500"))
            .and(body_string_contains("currency=usd"))
            .and(body_string_contains("metadata%5Buser_id%5D=7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "pi_1",
                "client_secret": "pi_1_secret_abc",
                "amount": 2500
            })))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(&config(&server.uri(), "sk_test_123")).unwrap();
        let intent = gateway.create_payment_intent(&request()).await.unwrap();

        assert_eq!(intent.id, "pi_1");
        assert_eq!(intent.client_secret, "pi_1_secret_abc");
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": { "message": "Your card was declined." }
            })))
            .mount(&server)
            .await;

        let gateway = StripeGateway::new(&config(&server.uri(), "sk_test_123")).unwrap();
        let err = gateway.create_payment_intent(&request()).await.unwrap_err();

        assert!(matches!(
            err,
            PlatformError::PaymentGateway { ref message } if message == "Your card was declined."
        ));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let gateway = StripeGateway::new(&config("http://127.0.0.1:9", "")).unwrap();
        let err = gateway.create_payment_intent(&request()).await.unwrap_err();
        assert_eq!(err.code(), -502);
    }
}

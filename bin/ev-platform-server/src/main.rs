//! Eventy Platform Server
//!
//! Serves the back-office (`/backoffice`) and mobile (`/mobile`) REST APIs,
//! a health check at `/health` and Swagger UI at `/docs`.
//!
//! Configuration is read from `EVENTY_CONFIG` / `eventy.toml` and the
//! environment (a `.env` file is loaded first if present); see `ev-config`
//! for the full variable list. `RUST_LOG` overrides the configured log level.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{http::Method, response::Json, routing::get, Router};
use ev_config::{AppConfig, LogFormat, LoggingConfig};
use ev_platform::api::{platform_router, EventyApiDoc};
use ev_platform::service::StripeGateway;
use ev_platform::Database;
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.logging);

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    match AppConfig::config_path() {
        Some(path) => info!("Loaded configuration from {}", path.display()),
        None => info!("No configuration file found; using defaults and environment"),
    }
    info!("Starting Eventy Platform Server");
    if config.uses_default_jwt_secret() {
        warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let db = Database::connect(&config.database).await.context("Failed to connect to database")?;
    db.init_schema().await?;

    if config.payments.stripe_secret_key.is_empty() {
        warn!("STRIPE_SECRET_KEY is not set; /mobile/pay will fail");
    }
    let payments = Arc::new(StripeGateway::new(&config.payments)?);

    if !config.auth.protect_backoffice {
        warn!("Back-office authentication is disabled");
    }

    let app = Router::new()
        .route("/health", get(health_handler))
        .merge(platform_router(&db, &config, payments))
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", EventyApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer());

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);
    info!("Swagger UI available at http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool().close().await;
    info!("Eventy Platform Server stopped");
    Ok(())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_cors_preflight_lists_allowed_methods() {
        let app = Router::new().route("/health", get(health_handler)).layer(cors_layer());
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let allowed = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        let mut methods: Vec<&str> = allowed.split(',').map(str::trim).collect();
        methods.sort_unstable();
        assert_eq!(methods, ["DELETE", "GET", "OPTIONS", "POST", "PUT"]);
    }
}

//! HTTP adapters - REST API implementations.
//!
//! `app_router` assembles the full service: checkout endpoints under `/api`,
//! the health probe, and the shared tower layers.

pub mod auth;
pub mod checkout;
pub mod error;

use axum::routing::get;
use axum::Router;
use http::{HeaderName, HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use auth::{AuthenticatedUser, USER_ID_HEADER};
pub use checkout::{checkout_router, CheckoutAppState};
pub use error::{ApiError, ErrorResponse};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Builds the application router with request id, tracing, CORS and
/// timeout layers, outermost first.
pub fn app_router(state: CheckoutAppState, server: &ServerConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(checkout::handlers::health))
        .nest("/api", checkout_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(cors_layer(&server.cors_origins_list()))
                .layer(TimeoutLayer::new(server.request_timeout())),
        )
}

/// Any origin when none are configured.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryCheckoutStore;
    use crate::adapters::razorpay::MockGateway;
    use crate::application::handlers::{
        CheckoutSettings, EnrollmentProjector, IngestorConfig, ReconciliationEngine,
        WebhookIngestor,
    };
    use crate::domain::webhook::WebhookVerifier;

    fn state() -> CheckoutAppState {
        let store = Arc::new(InMemoryCheckoutStore::new());
        let gateway = Arc::new(MockGateway::new());
        let projector = Arc::new(EnrollmentProjector::new(store.clone(), store.clone(), 30, 100));
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            gateway.clone(),
            projector.clone(),
        ));
        let ingestor = Arc::new(WebhookIngestor::new(
            WebhookVerifier::new(SecretString::new("whsec".to_string())),
            store.clone(),
            store.clone(),
            engine.clone(),
            IngestorConfig::default(),
        ));
        CheckoutAppState {
            intents: store.clone(),
            coupons: store.clone(),
            enrollments: store,
            gateway,
            projector,
            engine,
            ingestor,
            settings: CheckoutSettings {
                currency: "INR".to_string(),
                callback_url: "https://courses.test/return".to_string(),
                description: "Course enrollment".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn health_responds_with_request_id() {
        let app = app_router(state(), &ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn api_routes_are_mounted_under_api() {
        let app = app_router(state(), &ServerConfig::default());

        let response = app
            .oneshot(Request::builder().uri("/payments/callback").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unparseable_origins_are_skipped() {
        // Builds without panicking on a bad entry.
        let _ = cors_layer(&["https://courses.test".to_string(), "bad\norigin".to_string()]);
    }
}

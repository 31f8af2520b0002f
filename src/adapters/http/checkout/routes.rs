//! Axum router configuration for checkout endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    complete_free_enrollment, create_payment, payment_callback, payment_status, razorpay_webhook,
    validate_coupon, CheckoutAppState,
};

/// User-facing routes (require `X-User-Id`).
///
/// - `POST /coupons/validate`
/// - `POST /payments`
/// - `GET /payments/callback`
/// - `GET /payments/:id/status`
/// - `POST /enrollments/free`
pub fn checkout_routes() -> Router<CheckoutAppState> {
    Router::new()
        .route("/coupons/validate", post(validate_coupon))
        .route("/payments", post(create_payment))
        .route("/payments/callback", get(payment_callback))
        .route("/payments/:id/status", get(payment_status))
        .route("/enrollments/free", post(complete_free_enrollment))
}

/// Gateway webhook routes. No user auth; the body signature is verified.
pub fn webhook_routes() -> Router<CheckoutAppState> {
    Router::new().route("/razorpay", post(razorpay_webhook))
}

/// Complete checkout router, suitable for mounting at `/api`.
pub fn checkout_router() -> Router<CheckoutAppState> {
    checkout_routes().nest("/webhooks", webhook_routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use secrecy::SecretString;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::adapters::memory::InMemoryCheckoutStore;
    use crate::adapters::razorpay::MockGateway;
    use crate::application::handlers::{
        CheckoutSettings, EnrollmentProjector, IngestorConfig, ReconciliationEngine,
        WebhookIngestor,
    };
    use crate::domain::coupon::fixed_coupon;
    use crate::domain::webhook::{sign_payload, WebhookVerifier};
    use crate::ports::PaymentIntentRepository;

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    const SECRET: &str = "whsec_routes";

    struct TestApp {
        store: Arc<InMemoryCheckoutStore>,
        gateway: Arc<MockGateway>,
        router: Router,
    }

    fn test_app() -> TestApp {
        let store = Arc::new(InMemoryCheckoutStore::new());
        let gateway = Arc::new(MockGateway::new());
        let projector = Arc::new(EnrollmentProjector::new(store.clone(), store.clone(), 30, 100));
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            gateway.clone(),
            projector.clone(),
        ));
        let ingestor = Arc::new(WebhookIngestor::new(
            WebhookVerifier::new(SecretString::new(SECRET.to_string())),
            store.clone(),
            store.clone(),
            engine.clone(),
            IngestorConfig::default(),
        ));
        let state = CheckoutAppState {
            intents: store.clone(),
            coupons: store.clone(),
            enrollments: store.clone(),
            gateway: gateway.clone(),
            projector,
            engine,
            ingestor,
            settings: CheckoutSettings {
                currency: "INR".to_string(),
                callback_url: "https://courses.test/payment/return".to_string(),
                description: "Course enrollment".to_string(),
            },
        };

        TestApp {
            store,
            gateway,
            router: checkout_router().with_state(state),
        }
    }

    fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, user: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("X-User-Id", user)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_payment(app: &TestApp, user: &str) -> Value {
        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/payments",
                Some(user),
                json!({
                    "amount": 999,
                    "customer": { "name": "Jane", "email": "jane@x.com" }
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    // ════════════════════════════════════════════════════════════════════════════
    // User Endpoints
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn requests_without_user_are_unauthorized() {
        let app = test_app();

        let response = app
            .router
            .oneshot(json_request("POST", "/payments", None, json!({})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn coupon_validation_reports_rejection_as_ok() {
        let app = test_app();

        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/coupons/validate",
                Some("buyer"),
                json!({ "code": "NOPE", "amount": 999 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["valid"], false);
    }

    #[tokio::test]
    async fn create_payment_returns_checkout_url() {
        let app = test_app();
        app.store.insert_coupon(fixed_coupon("LAUNCH500", 500)).unwrap();

        let response = app
            .router
            .clone()
            .oneshot(json_request(
                "POST",
                "/payments",
                Some("buyer"),
                json!({
                    "amount": 999,
                    "coupon_code": "launch500",
                    "customer": { "name": "Jane", "email": "jane@x.com" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["final_amount"], 499);
        assert_eq!(body["discount"], 500);
        assert!(body["checkout_url"].as_str().unwrap().starts_with("http"));
    }

    #[tokio::test]
    async fn gateway_failure_maps_to_bad_gateway() {
        let app = test_app();
        app.gateway.fail_creates_with(crate::ports::GatewayError::network("connection refused"));

        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/payments",
                Some("buyer"),
                json!({
                    "amount": 999,
                    "customer": { "name": "Jane", "email": "jane@x.com" }
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn callback_with_verified_payment_reports_success() {
        let app = test_app();
        let created = create_payment(&app, "buyer").await;
        let intent_id = created["intent_id"].as_str().unwrap().parse().unwrap();
        let intent = app.store.find_by_id(intent_id).await.unwrap().unwrap();
        let order_id = intent.provider_order_id().unwrap().to_string();
        app.gateway.mark_paid(&order_id, "pay_1");

        let uri = format!(
            "/payments/callback?razorpay_payment_link_id={}&razorpay_payment_id=pay_1&razorpay_payment_link_status=paid",
            order_id
        );
        let response = app.router.clone().oneshot(get_request(&uri, "buyer")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["state"], "success");

        let status_uri = format!("/payments/{}/status", intent_id);
        let response = app.router.oneshot(get_request(&status_uri, "buyer")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["enrolled"], true);
    }

    #[tokio::test]
    async fn status_of_another_users_payment_is_forbidden() {
        let app = test_app();
        let created = create_payment(&app, "buyer").await;
        let uri = format!("/payments/{}/status", created["intent_id"].as_str().unwrap());

        let response = app.router.oneshot(get_request(&uri, "intruder")).await.unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn free_enrollment_with_full_coupon_enrolls() {
        let app = test_app();
        app.store.insert_coupon(fixed_coupon("SCHOLAR", 999)).unwrap();

        let response = app
            .router
            .oneshot(json_request(
                "POST",
                "/enrollments/free",
                Some("buyer"),
                json!({ "coupon_code": "SCHOLAR", "amount": 999 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["enrolled"], true);
        assert_eq!(body["already_enrolled"], false);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook Endpoint
    // ════════════════════════════════════════════════════════════════════════════

    fn webhook_request(body: &[u8], header: &str, signature: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhooks/razorpay")
            .header(header, signature)
            .body(Body::from(body.to_vec()))
            .unwrap()
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_is_unauthorized() {
        let app = test_app();
        let body = br#"{"event":"payment.captured"}"#;

        let response = app
            .router
            .oneshot(webhook_request(body, "X-Signature", "deadbeef"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(app.store.webhook_events().unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_accepts_razorpay_signature_alias() {
        let app = test_app();
        let body = br#"{"event":"order.paid","payload":{}}"#;
        let signature = sign_payload(SECRET, body);

        let response = app
            .router
            .oneshot(webhook_request(body, "X-Razorpay-Signature", &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "ignored");
    }

    #[tokio::test]
    async fn unmatched_webhook_is_still_acknowledged() {
        let app = test_app();
        let body = serde_json::to_vec(&json!({
            "event": "payment.captured",
            "payload": { "payment": { "entity": {
                "id": "pay_orphan", "amount": 12_300, "email": "nobody@x.com", "notes": []
            } } }
        }))
        .unwrap();
        let signature = sign_payload(SECRET, &body);

        let response = app
            .router
            .oneshot(webhook_request(&body, "X-Signature", &signature))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["outcome"], "unmatched");
    }
}

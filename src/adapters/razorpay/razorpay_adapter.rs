//! Razorpay payment gateway adapter.
//!
//! Implements `PaymentGateway` over Razorpay's Payment Links API:
//! `POST /v1/payment_links` to create, `GET /v1/payment_links/{id}` to
//! re-query. Authenticates with HTTP Basic auth (key id / key secret).
//!
//! Amounts cross this boundary in whole rupees and are converted to paise
//! on the way out.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::payment::to_minor_units;
use crate::domain::webhook::INTENT_ID_NOTE;
use crate::ports::{
    CreatePaymentRequest, GatewayError, GatewayErrorCode, PaymentGateway, PaymentRequestCreated,
    RemotePaymentStatus,
};

use super::api_types::{
    CreatePaymentLinkBody, ErrorEnvelope, LinkCustomer, LinkNotes, LinkNotify, PaymentLink,
};

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    key_id: String,
    key_secret: SecretString,
    api_base_url: String,
    timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: SecretString) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret,
            api_base_url: "https://api.razorpay.com".to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Razorpay gateway adapter.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn link_body(&self, request: &CreatePaymentRequest) -> CreatePaymentLinkBody {
        let intent_id = request.intent_id.to_string();
        CreatePaymentLinkBody {
            amount: to_minor_units(request.amount),
            currency: request.currency.clone(),
            accept_partial: false,
            reference_id: intent_id.clone(),
            description: request.description.clone(),
            customer: LinkCustomer {
                name: request.customer.name.clone(),
                email: request.customer.email.clone(),
                contact: request.customer.contact.clone(),
            },
            notify: LinkNotify {
                sms: false,
                email: false,
            },
            reminder_enable: false,
            notes: LinkNotes { intent_id },
            callback_url: request.callback_url.clone(),
            callback_method: "get".to_string(),
        }
    }

    async fn read_link(&self, response: reqwest::Response) -> Result<PaymentLink, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                status = %status,
                body = %error_text,
                "Razorpay API returned an error"
            );
            return Err(error_for_status(status, &error_text));
        }

        response.json::<PaymentLink>().await.map_err(|e| {
            GatewayError::provider(format!("Failed to parse Razorpay response: {}", e))
        })
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::timeout(err.to_string())
    } else {
        GatewayError::network(err.to_string())
    }
}

fn error_for_status(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();
    let description = envelope
        .as_ref()
        .map(|e| e.error.description.clone())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

    let err = match status.as_u16() {
        401 | 403 => GatewayError::authentication(description),
        404 => GatewayError::new(GatewayErrorCode::NotFound, description),
        429 => GatewayError::new(GatewayErrorCode::RateLimitExceeded, description),
        400..=499 => GatewayError::rejected(description),
        _ => GatewayError::provider(description),
    };
    match envelope {
        Some(env) => err.with_provider_code(env.error.code),
        None => err,
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_payment_request(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentRequestCreated, GatewayError> {
        let url = format!("{}/v1/payment_links", self.config.api_base_url);
        let body = self.link_body(&request);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let link = self.read_link(response).await?;
        if link.short_url.is_empty() {
            return Err(GatewayError::provider("Payment link has no checkout URL"));
        }

        tracing::info!(
            intent_id = %request.intent_id,
            provider_order_id = %link.id,
            "Created Razorpay payment link"
        );

        Ok(PaymentRequestCreated {
            provider_order_id: link.id,
            checkout_url: link.short_url,
        })
    }

    async fn fetch_status(&self, provider_order_id: &str) -> Result<RemotePaymentStatus, GatewayError> {
        let url = format!(
            "{}/v1/payment_links/{}",
            self.config.api_base_url, provider_order_id
        );

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .send()
            .await
            .map_err(transport_error)?;

        let link = self.read_link(response).await?;
        let status = link.remote_status();
        tracing::debug!(
            provider_order_id = %provider_order_id,
            link_status = %link.status,
            paid = status.is_paid(),
            "Fetched Razorpay payment link"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::PaymentIntentId;
    use crate::ports::Customer;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct StubState {
        created: Arc<Mutex<Vec<Value>>>,
        auth_headers: Arc<Mutex<Vec<String>>>,
    }

    async fn create_link(
        State(state): State<StubState>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
            state.auth_headers.lock().unwrap().push(auth.to_string());
        }
        state.created.lock().unwrap().push(body);
        (
            StatusCode::OK,
            Json(json!({
                "id": "plink_TEST1",
                "short_url": "https://rzp.io/i/test1",
                "status": "created"
            })),
        )
    }

    async fn fetch_link(Path(id): Path<String>) -> (StatusCode, Json<Value>) {
        match id.as_str() {
            "plink_paid" => (
                StatusCode::OK,
                Json(json!({
                    "id": id,
                    "short_url": "https://rzp.io/i/paid",
                    "status": "paid",
                    "payments": [{ "payment_id": "pay_42", "status": "captured" }]
                })),
            ),
            "plink_pending" => (
                StatusCode::OK,
                Json(json!({ "id": id, "status": "created", "payments": null })),
            ),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": { "code": "BAD_REQUEST_ERROR", "description": "The id provided does not exist" }
                })),
            ),
        }
    }

    async fn spawn_stub() -> (String, StubState) {
        let state = StubState::default();
        let app = Router::new()
            .route("/v1/payment_links", post(create_link))
            .route("/v1/payment_links/:id", get(fetch_link))
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), state)
    }

    fn gateway(base_url: &str) -> RazorpayGateway {
        RazorpayGateway::new(
            RazorpayConfig::new("rzp_test_key", SecretString::new("secret".to_string()))
                .with_base_url(base_url),
        )
        .unwrap()
    }

    fn request(intent_id: PaymentIntentId) -> CreatePaymentRequest {
        CreatePaymentRequest {
            intent_id,
            amount: 499,
            currency: "INR".to_string(),
            customer: Customer {
                name: "Jane".to_string(),
                email: "jane@x.com".to_string(),
                contact: None,
            },
            description: "Course enrollment".to_string(),
            callback_url: "https://courses.example.com/payment/callback".to_string(),
        }
    }

    #[tokio::test]
    async fn create_sends_minor_units_and_intent_reference() {
        let (base, state) = spawn_stub().await;
        let intent_id = PaymentIntentId::new();

        let created = gateway(&base)
            .create_payment_request(request(intent_id))
            .await
            .unwrap();

        assert_eq!(created.provider_order_id, "plink_TEST1");
        assert_eq!(created.checkout_url, "https://rzp.io/i/test1");

        let bodies = state.created.lock().unwrap().clone();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0]["amount"], 49_900);
        assert_eq!(bodies[0]["reference_id"], intent_id.to_string());
        assert_eq!(bodies[0]["notes"][INTENT_ID_NOTE], intent_id.to_string());
        assert_eq!(bodies[0]["accept_partial"], false);

        let auth = state.auth_headers.lock().unwrap().clone();
        assert!(auth[0].starts_with("Basic "));
    }

    #[tokio::test]
    async fn fetch_status_maps_paid_link() {
        let (base, _) = spawn_stub().await;
        let status = gateway(&base).fetch_status("plink_paid").await.unwrap();
        assert_eq!(
            status,
            RemotePaymentStatus::Paid {
                provider_payment_id: Some("pay_42".to_string())
            }
        );
    }

    #[tokio::test]
    async fn fetch_status_maps_created_link_to_pending() {
        let (base, _) = spawn_stub().await;
        let status = gateway(&base).fetch_status("plink_pending").await.unwrap();
        assert_eq!(status, RemotePaymentStatus::Pending);
    }

    #[tokio::test]
    async fn api_error_carries_provider_code() {
        let (base, _) = spawn_stub().await;
        let err = gateway(&base).fetch_status("plink_missing").await.unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::InvalidRequest);
        assert_eq!(err.provider_code.as_deref(), Some("BAD_REQUEST_ERROR"));
        assert!(!err.retryable);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_retryable_network_error() {
        let err = gateway("http://127.0.0.1:9")
            .fetch_status("plink_paid")
            .await
            .unwrap_err();
        assert!(err.retryable);
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = error_for_status(reqwest::StatusCode::BAD_GATEWAY, "");
        assert_eq!(err.code, GatewayErrorCode::ProviderError);
        assert!(err.retryable);
        assert_eq!(err.message, "HTTP 502");
    }

    #[test]
    fn unauthorized_maps_to_authentication_error() {
        let err = error_for_status(reqwest::StatusCode::UNAUTHORIZED, "not json");
        assert_eq!(err.code, GatewayErrorCode::AuthenticationError);
        assert!(err.provider_code.is_none());
    }
}

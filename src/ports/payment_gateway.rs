//! Payment gateway port.
//!
//! Two calls: create a hosted payment request for an intent, and fetch the
//! authoritative status of a request created earlier. Everything else the
//! gateway does (settlement, fraud checks, its own ledger) is opaque.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, ErrorCode, PaymentIntentId};
use crate::domain::payment::CheckoutError;

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Creates a remote payment request (a hosted "payment link").
    ///
    /// The intent id travels with the request so the gateway can relay it
    /// back in webhooks.
    async fn create_payment_request(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentRequestCreated, GatewayError>;

    /// Re-queries the gateway for a request's current status.
    async fn fetch_status(&self, provider_order_id: &str) -> Result<RemotePaymentStatus, GatewayError>;
}

/// Payer details forwarded to the gateway's checkout page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub contact: Option<String>,
}

/// Request to create a hosted payment.
#[derive(Debug, Clone)]
pub struct CreatePaymentRequest {
    pub intent_id: PaymentIntentId,
    /// Whole currency units; adapters convert to minor units.
    pub amount: i64,
    pub currency: String,
    pub customer: Customer,
    pub description: String,
    pub callback_url: String,
}

/// Identifiers returned when the gateway accepts a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestCreated {
    pub provider_order_id: String,
    pub checkout_url: String,
}

/// Gateway-side status of a payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemotePaymentStatus {
    /// Created but not paid yet.
    Pending,
    /// Paid. The payment id may be missing if the gateway has not yet
    /// attached it to the request.
    Paid { provider_payment_id: Option<String> },
    /// The gateway explicitly reports the charge as failed, expired or
    /// cancelled.
    Failed { reason: String },
}

impl RemotePaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, RemotePaymentStatus::Paid { .. })
    }
}

/// Error from a gateway call.
///
/// A gateway error never changes local state: the intent stays pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Gateway's own error code, if it sent one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::AuthenticationError, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(GatewayErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        let code = if err.retryable {
            ErrorCode::GatewayUnavailable
        } else {
            ErrorCode::GatewayError
        };
        DomainError::new(code, err.message)
    }
}

impl From<GatewayError> for CheckoutError {
    fn from(err: GatewayError) -> Self {
        CheckoutError::gateway(err.to_string(), err.retryable)
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    NetworkError,
    Timeout,
    AuthenticationError,
    NotFound,
    InvalidRequest,
    RateLimitExceeded,
    ProviderError,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::RateLimitExceeded
                | GatewayErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::InvalidRequest => "invalid_request",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

//! API error responses.
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | ValidationFailed, CouponRejected | 400 |
//! | Forbidden | 403 |
//! | IntentNotFound | 404 |
//! | InvalidState | 409 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;
use crate::domain::payment::CheckoutError;

/// Error body shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

/// API error type that converts checkout errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub CheckoutError);

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(CheckoutError::from(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CheckoutError::ValidationFailed { .. } | CheckoutError::CouponRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            CheckoutError::Forbidden => StatusCode::FORBIDDEN,
            CheckoutError::IntentNotFound(_) => StatusCode::NOT_FOUND,
            CheckoutError::InvalidState { .. } => StatusCode::CONFLICT,
            CheckoutError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            CheckoutError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.0.code().to_string();

        let body = match &self.0 {
            CheckoutError::Infrastructure(msg) => {
                tracing::error!(error = %msg, "Request failed on infrastructure error");
                ErrorResponse::new(code, "Internal error")
            }
            CheckoutError::ValidationFailed { field, .. } => ErrorResponse::with_details(
                code,
                self.0.message(),
                serde_json::json!({ "field": field }),
            ),
            other => ErrorResponse::new(code, other.message()),
        };

        (status, Json(body)).into_response()
    }
}

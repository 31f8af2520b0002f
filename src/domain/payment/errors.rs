//! Checkout-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | IntentNotFound | 404 |
//! | Forbidden | 403 |
//! | CouponRejected | 400 |
//! | ValidationFailed | 400 |
//! | InvalidState | 409 |
//! | Gateway | 502 |
//! | Infrastructure | 500 |

use crate::domain::coupon::CouponRejection;
use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Errors surfaced by the purchase and confirmation flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// No intent matches the given identifier.
    IntentNotFound(String),

    /// The caller does not own the intent.
    Forbidden,

    /// A coupon was supplied but cannot be applied.
    CouponRejected(CouponRejection),

    ValidationFailed { field: String, message: String },

    InvalidState { current: String, attempted: String },

    /// The gateway call failed. Nothing was persisted.
    Gateway { message: String, retryable: bool },

    Infrastructure(String),
}

impl CheckoutError {
    pub fn intent_not_found(id: impl Into<String>) -> Self {
        CheckoutError::IntentNotFound(id.into())
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CheckoutError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        CheckoutError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn gateway(message: impl Into<String>, retryable: bool) -> Self {
        CheckoutError::Gateway {
            message: message.into(),
            retryable,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::IntentNotFound(_) => ErrorCode::PaymentIntentNotFound,
            CheckoutError::Forbidden => ErrorCode::Forbidden,
            CheckoutError::CouponRejected(reason) => reason.code(),
            CheckoutError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            CheckoutError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            CheckoutError::Gateway { retryable: true, .. } => ErrorCode::GatewayUnavailable,
            CheckoutError::Gateway { .. } => ErrorCode::GatewayError,
            CheckoutError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckoutError::IntentNotFound(id) => format!("Payment not found: {}", id),
            CheckoutError::Forbidden => "Payment belongs to another user".to_string(),
            CheckoutError::CouponRejected(reason) => reason.to_string(),
            CheckoutError::ValidationFailed { field, message } => {
                format!("Validation failed for {}: {}", field, message)
            }
            CheckoutError::InvalidState { current, attempted } => {
                format!("Cannot {} while {}", attempted, current)
            }
            CheckoutError::Gateway { message, .. } => format!("Payment gateway error: {}", message),
            CheckoutError::Infrastructure(msg) => format!("Internal error: {}", msg),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::Gateway { retryable: true, .. } | CheckoutError::Infrastructure(_)
        )
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CheckoutError {}

impl From<CouponRejection> for CheckoutError {
    fn from(reason: CouponRejection) -> Self {
        CheckoutError::CouponRejected(reason)
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        CheckoutError::ValidationFailed {
            field,
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::PaymentIntentNotFound => CheckoutError::IntentNotFound(err.message),
            ErrorCode::Forbidden => CheckoutError::Forbidden,
            ErrorCode::CouponExhausted => CheckoutError::CouponRejected(CouponRejection::Exhausted),
            ErrorCode::DuplicateCouponUsage => {
                CheckoutError::CouponRejected(CouponRejection::AlreadyUsed)
            }
            ErrorCode::ValidationFailed => CheckoutError::ValidationFailed {
                field: err.details.get("field").cloned().unwrap_or_default(),
                message: err.message,
            },
            ErrorCode::GatewayError => CheckoutError::gateway(err.message, false),
            ErrorCode::GatewayUnavailable => CheckoutError::gateway(err.message, true),
            _ => CheckoutError::Infrastructure(err.message),
        }
    }
}

impl From<CheckoutError> for DomainError {
    fn from(err: CheckoutError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}

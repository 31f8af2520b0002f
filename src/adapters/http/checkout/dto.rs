//! Data Transfer Objects for the checkout endpoints.
//!
//! Request DTOs deserialize from JSON bodies or query strings. Response
//! DTOs are flat views of application results.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CallbackState, CompleteFreeEnrollmentResult, CouponValidation, InitiatePaymentResult,
    RedirectCallbackResult,
};
use crate::domain::enrollment::Enrollment;
use crate::domain::foundation::{PaymentIntentId, Timestamp};
use crate::domain::payment::PaymentStatus;
use crate::domain::webhook::WebhookOutcome;
use crate::ports::{Customer, PaymentStatusView};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to check a coupon against a price.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateCouponRequest {
    pub code: String,
    /// List price in whole currency units.
    pub amount: i64,
}

/// Request to start a paid purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentRequest {
    pub amount: i64,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub customer: Customer,
}

/// Query string the gateway appends to the redirect URL.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallbackParams {
    pub razorpay_payment_link_id: String,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_link_status: Option<String>,
}

/// Request to enroll without payment.
#[derive(Debug, Clone, Deserialize)]
pub struct FreeEnrollmentRequest {
    pub coupon_code: String,
    pub amount: i64,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Coupon check result. Rejections are a 200 with `valid: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponValidationResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<CouponValidation> for CouponValidationResponse {
    fn from(validation: CouponValidation) -> Self {
        match validation {
            CouponValidation::Valid(quote) => Self {
                valid: true,
                code: Some(quote.code.as_str().to_string()),
                discount: Some(quote.discount),
                final_price: Some(quote.final_price),
                reason: None,
            },
            CouponValidation::Invalid(reason) => Self {
                valid: false,
                code: None,
                discount: None,
                final_price: None,
                reason: Some(reason.to_string()),
            },
        }
    }
}

/// Created purchase. The client sends the buyer to `checkout_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub intent_id: PaymentIntentId,
    pub checkout_url: String,
    pub final_amount: i64,
    pub discount: i64,
}

impl From<InitiatePaymentResult> for CreatePaymentResponse {
    fn from(result: InitiatePaymentResult) -> Self {
        Self {
            intent_id: result.intent.id(),
            checkout_url: result.checkout_url,
            final_amount: result.intent.amount(),
            discount: result.quote.map(|q| q.discount).unwrap_or(0),
        }
    }
}

/// What the return page should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentCallbackResponse {
    pub intent_id: PaymentIntentId,
    pub state: CallbackState,
}

impl From<RedirectCallbackResult> for PaymentCallbackResponse {
    fn from(result: RedirectCallbackResult) -> Self {
        Self {
            intent_id: result.intent_id,
            state: result.state,
        }
    }
}

/// Enrollment state after a free enrollment request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentResponse {
    pub enrolled: bool,
    pub already_enrolled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_start: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort_end: Option<Timestamp>,
}

impl EnrollmentResponse {
    fn from_enrollment(enrollment: &Enrollment, already_enrolled: bool) -> Self {
        Self {
            enrolled: enrollment.enrolled,
            already_enrolled,
            cohort_start: enrollment.cohort.map(|w| w.start()),
            cohort_end: enrollment.cohort.map(|w| w.end()),
        }
    }
}

impl From<CompleteFreeEnrollmentResult> for EnrollmentResponse {
    fn from(result: CompleteFreeEnrollmentResult) -> Self {
        match result {
            CompleteFreeEnrollmentResult::Enrolled { enrollment, .. } => {
                Self::from_enrollment(&enrollment, false)
            }
            CompleteFreeEnrollmentResult::AlreadyEnrolled(enrollment) => {
                Self::from_enrollment(&enrollment, true)
            }
        }
    }
}

/// Status snapshot the client poller reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentStatusResponse {
    pub intent_id: PaymentIntentId,
    pub status: PaymentStatus,
    pub enrolled: bool,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            intent_id: view.intent_id,
            status: view.status,
            enrolled: view.enrolled,
        }
    }
}

/// Webhook acknowledgement body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookAck {
    pub outcome: &'static str,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        Self {
            outcome: outcome.as_str(),
        }
    }
}

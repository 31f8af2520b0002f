//! HTTP handlers for checkout endpoints.
//!
//! These handlers connect Axum routes to application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::application::handlers::{
    CheckoutSettings, CompleteFreeEnrollmentCommand, CompleteFreeEnrollmentHandler,
    EnrollmentProjector, GetPaymentStatusHandler, GetPaymentStatusQuery, IngestWebhookCommand,
    InitiatePaymentCommand, InitiatePaymentHandler, ReconciliationEngine, RedirectCallbackHandler,
    RedirectCallbackQuery, ValidateCouponHandler, ValidateCouponQuery, WebhookIngestor,
};
use crate::domain::foundation::PaymentIntentId;
use crate::ports::{CouponRepository, EnrollmentRepository, PaymentGateway, PaymentIntentRepository};

use super::dto::{
    CouponValidationResponse, CreatePaymentRequest, CreatePaymentResponse, EnrollmentResponse,
    FreeEnrollmentRequest, PaymentCallbackParams, PaymentCallbackResponse, PaymentStatusResponse,
    ValidateCouponRequest, WebhookAck,
};
use crate::adapters::http::auth::AuthenticatedUser;
use crate::adapters::http::error::{ApiError, ErrorResponse};

/// Signature headers accepted on webhook deliveries, in lookup order.
pub const SIGNATURE_HEADERS: [&str; 2] = ["X-Signature", "X-Razorpay-Signature"];

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped. The engine and the
/// ingestor are shared so every confirmation path funnels through one writer.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub intents: Arc<dyn PaymentIntentRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub enrollments: Arc<dyn EnrollmentRepository>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub projector: Arc<EnrollmentProjector>,
    pub engine: Arc<ReconciliationEngine>,
    pub ingestor: Arc<WebhookIngestor>,
    pub settings: CheckoutSettings,
}

impl CheckoutAppState {
    pub fn validate_coupon_handler(&self) -> ValidateCouponHandler {
        ValidateCouponHandler::new(self.coupons.clone())
    }

    pub fn initiate_payment_handler(&self) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            self.intents.clone(),
            self.coupons.clone(),
            self.gateway.clone(),
            self.settings.clone(),
        )
    }

    pub fn redirect_callback_handler(&self) -> RedirectCallbackHandler {
        RedirectCallbackHandler::new(self.intents.clone(), self.engine.clone())
    }

    pub fn payment_status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.intents.clone(), self.enrollments.clone())
    }

    pub fn free_enrollment_handler(&self) -> CompleteFreeEnrollmentHandler {
        CompleteFreeEnrollmentHandler::new(
            self.coupons.clone(),
            self.enrollments.clone(),
            self.projector.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Coupon Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/coupons/validate - Quote a coupon against a price
pub async fn validate_coupon(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let query = ValidateCouponQuery {
        code: request.code,
        user_id: user.user_id,
        amount: request.amount,
    };

    let validation = state.validate_coupon_handler().handle(query).await?;

    Ok(Json(CouponValidationResponse::from(validation)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments - Create an intent and a hosted payment request
pub async fn create_payment(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = InitiatePaymentCommand {
        user_id: user.user_id,
        amount: request.amount,
        coupon_code: request.coupon_code,
        customer: request.customer,
    };

    let result = state.initiate_payment_handler().handle(cmd).await?;

    Ok((StatusCode::CREATED, Json(CreatePaymentResponse::from(result))))
}

/// GET /api/payments/callback - Browser return from the hosted payment page
pub async fn payment_callback(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Query(params): Query<PaymentCallbackParams>,
) -> Result<impl IntoResponse, ApiError> {
    let query = RedirectCallbackQuery {
        user_id: user.user_id,
        provider_order_id: params.razorpay_payment_link_id,
        provider_payment_id: params.razorpay_payment_id,
        reported_status: params.razorpay_payment_link_status,
    };

    let result = state.redirect_callback_handler().handle(query).await?;

    Ok(Json(PaymentCallbackResponse::from(result)))
}

/// GET /api/payments/:id/status - Read-only status for the client poller
pub async fn payment_status(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Path(intent_id): Path<PaymentIntentId>,
) -> Result<impl IntoResponse, ApiError> {
    let query = GetPaymentStatusQuery {
        user_id: user.user_id,
        intent_id,
    };

    let view = state.payment_status_handler().handle(query).await?;

    Ok(Json(PaymentStatusResponse::from(view)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Enrollment Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/enrollments/free - Enroll with a coupon that covers the full price
pub async fn complete_free_enrollment(
    State(state): State<CheckoutAppState>,
    user: AuthenticatedUser,
    Json(request): Json<FreeEnrollmentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let cmd = CompleteFreeEnrollmentCommand {
        user_id: user.user_id,
        coupon_code: request.coupon_code,
        amount: request.amount,
    };

    let result = state.free_enrollment_handler().handle(cmd).await?;

    Ok(Json(EnrollmentResponse::from(result)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoints (no user auth, signature verified)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/razorpay - Gateway push notification
///
/// Only signature failures (401) and storage failures (500) are errors.
/// Every other delivery is acknowledged so the sender stops retrying.
pub async fn razorpay_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = SIGNATURE_HEADERS
        .iter()
        .find_map(|name| headers.get(*name))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = IngestWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    match state.ingestor.handle(cmd).await {
        Ok(outcome) => (StatusCode::OK, Json(WebhookAck::from(outcome))).into_response(),
        Err(e) => {
            if e.is_retryable() {
                tracing::error!(error = %e, "Webhook processing failed; sender will retry");
            }
            let code = if e.is_retryable() {
                "WEBHOOK_PROCESSING_FAILED"
            } else {
                "INVALID_WEBHOOK_SIGNATURE"
            };
            (e.status_code(), Json(ErrorResponse::new(code, e.to_string()))).into_response()
        }
    }
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

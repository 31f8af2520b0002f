//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations over the
//! ports. Grouped by the flow they serve.

pub mod coupon;
pub mod payment;
pub mod webhook;

pub use coupon::{CouponValidation, ValidateCouponHandler, ValidateCouponQuery};
pub use payment::{
    CallbackState, CheckoutSettings, CompleteFreeEnrollmentCommand, CompleteFreeEnrollmentHandler,
    CompleteFreeEnrollmentResult, ConfirmOutcome, EnrollmentProjector, GetPaymentStatusHandler,
    GetPaymentStatusQuery, InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
    ProjectionReport, ReconciliationEngine, RedirectCallbackHandler, RedirectCallbackQuery,
    RedirectCallbackResult, Verification,
};
pub use webhook::{IngestWebhookCommand, IngestorConfig, WebhookIngestor};

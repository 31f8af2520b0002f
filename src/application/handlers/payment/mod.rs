//! Payment handlers.
//!
//! ## Commands
//! - Initiating a purchase (intent plus remote payment request)
//! - Handling the gateway's redirect callback
//! - Completing a zero-priced enrollment
//!
//! ## Queries
//! - Payment status for the client poller
//!
//! ## Services
//! - `ReconciliationEngine`, the only writer of completed intents
//! - `EnrollmentProjector`, the side effects of a first completion

mod complete_free_enrollment;
mod enrollment_projector;
mod get_payment_status;
mod initiate_payment;
mod reconciliation_engine;
mod redirect_callback;

pub use complete_free_enrollment::{
    CompleteFreeEnrollmentCommand, CompleteFreeEnrollmentHandler, CompleteFreeEnrollmentResult,
};
pub use enrollment_projector::{EnrollmentProjector, ProjectionReport};
pub use get_payment_status::{GetPaymentStatusHandler, GetPaymentStatusQuery};
pub use initiate_payment::{
    CheckoutSettings, InitiatePaymentCommand, InitiatePaymentHandler, InitiatePaymentResult,
};
pub use reconciliation_engine::{ConfirmOutcome, ReconciliationEngine, Verification};
pub use redirect_callback::{
    CallbackState, RedirectCallbackHandler, RedirectCallbackQuery, RedirectCallbackResult,
};

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PaymentIntentRepository` - intents plus their coupon usage; owns the status CAS
//! - `CouponRepository` - coupon definitions and usage lookups
//! - `EnrollmentRepository` - enrollment fields on profiles
//! - `ReferralRepository` - referral transitions and rewards
//! - `WebhookEventRepository` - webhook audit log and manual-review queue
//!
//! ## External Ports
//!
//! - `PaymentGateway` - hosted payment creation and status re-query
//! - `PaymentStatusSource` - read-only status for the client poller

mod coupon_repository;
mod enrollment_repository;
mod payment_gateway;
mod payment_intent_repository;
mod payment_status_source;
mod referral_repository;
mod webhook_event_repository;

pub use coupon_repository::CouponRepository;
pub use enrollment_repository::EnrollmentRepository;
pub use payment_gateway::{
    CreatePaymentRequest, Customer, GatewayError, GatewayErrorCode, PaymentGateway,
    PaymentRequestCreated, RemotePaymentStatus,
};
pub use payment_intent_repository::PaymentIntentRepository;
pub use payment_status_source::{PaymentStatusSource, PaymentStatusView};
pub use referral_repository::ReferralRepository;
pub use webhook_event_repository::WebhookEventRepository;

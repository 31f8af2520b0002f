//! Adapters - Implementations of port interfaces.
//!
//! - `http` - axum router for the checkout API and gateway webhooks
//! - `memory` - in-memory storage for tests and local development
//! - `poller` - client-side reconciliation poller
//! - `postgres` - sqlx repositories
//! - `razorpay` - payment gateway client and its mock

pub mod http;
pub mod memory;
pub mod poller;
pub mod postgres;
pub mod razorpay;

pub use memory::InMemoryCheckoutStore;
pub use poller::{HttpStatusSource, InProcessStatusSource, PollOutcome, PollerConfig, ReconciliationPoller};
pub use postgres::{
    PostgresCouponRepository, PostgresEnrollmentRepository, PostgresPaymentIntentRepository,
    PostgresReferralRepository, PostgresWebhookEventRepository,
};
pub use razorpay::{MockGateway, RazorpayConfig, RazorpayGateway};

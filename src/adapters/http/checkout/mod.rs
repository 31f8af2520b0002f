//! HTTP adapter for checkout endpoints.
//!
//! - `POST /api/coupons/validate` - Quote a coupon
//! - `POST /api/payments` - Start a paid purchase
//! - `GET /api/payments/callback` - Browser return from the gateway
//! - `GET /api/payments/:id/status` - Status for the client poller
//! - `POST /api/enrollments/free` - Enroll with a full-price coupon
//! - `POST /api/webhooks/razorpay` - Gateway push notifications

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{CheckoutAppState, SIGNATURE_HEADERS};
pub use routes::{checkout_router, checkout_routes, webhook_routes};

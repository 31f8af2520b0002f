//! Course Checkout - payment reconciliation and enrollment unlocking.
//!
//! Coupons are priced and counted, purchases are recorded as payment
//! intents, and every confirmation path (redirect, webhook, client poll)
//! converges on one idempotent reconciliation engine that completes an
//! intent exactly once and then opens the buyer's cohort window.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

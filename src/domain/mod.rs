//! Domain layer - pure business logic with no infrastructure dependencies.

pub mod coupon;
pub mod enrollment;
pub mod foundation;
pub mod payment;
pub mod webhook;

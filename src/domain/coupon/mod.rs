//! Coupon ledger domain.
//!
//! Pure validation and pricing of discount codes. Persistence of usage
//! counters lives behind [`crate::ports::CouponRepository`].

mod code;
mod coupon;
mod errors;
mod usage;

pub use code::CouponCode;
pub use coupon::{Coupon, CouponQuote, DiscountType};
pub use errors::CouponRejection;
pub use usage::CouponUsage;

#[cfg(test)]
pub(crate) use coupon::tests::fixed_coupon;

//! Coupon handlers.

mod validate_coupon;

pub use validate_coupon::{CouponValidation, ValidateCouponHandler, ValidateCouponQuery};

pub(crate) use validate_coupon::quote_for_user;

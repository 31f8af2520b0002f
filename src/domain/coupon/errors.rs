//! Coupon rejection reasons.

use crate::domain::foundation::{DomainError, ErrorCode};
use thiserror::Error;

/// Why a coupon cannot be applied to a purchase.
///
/// Every variant renders as a message that can be shown to the customer
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
    #[error("Invalid coupon code")]
    NotFound,

    #[error("This coupon is no longer active")]
    Inactive,

    #[error("This coupon is not valid yet")]
    NotYetValid,

    #[error("This coupon has expired")]
    Expired,

    #[error("This coupon has reached its usage limit")]
    Exhausted,

    #[error("Minimum purchase of ₹{minimum} required for this coupon")]
    BelowMinimum { minimum: i64 },

    #[error("You have already used this coupon")]
    AlreadyUsed,

    #[error("Purchase amount is out of range")]
    InvalidAmount,

    #[error("This coupon cannot be applied")]
    Misconfigured,
}

impl CouponRejection {
    pub fn code(&self) -> ErrorCode {
        match self {
            CouponRejection::NotFound => ErrorCode::CouponNotFound,
            CouponRejection::Exhausted => ErrorCode::CouponExhausted,
            CouponRejection::AlreadyUsed => ErrorCode::DuplicateCouponUsage,
            CouponRejection::InvalidAmount => ErrorCode::ValidationFailed,
            _ => ErrorCode::CouponInvalid,
        }
    }
}

impl From<CouponRejection> for DomainError {
    fn from(reason: CouponRejection) -> Self {
        DomainError::new(reason.code(), reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_minimum_message_names_threshold() {
        let reason = CouponRejection::BelowMinimum { minimum: 1500 };
        assert_eq!(
            reason.to_string(),
            "Minimum purchase of ₹1500 required for this coupon"
        );
    }

    #[test]
    fn exhausted_maps_to_dedicated_code() {
        let err: DomainError = CouponRejection::Exhausted.into();
        assert_eq!(err.code, ErrorCode::CouponExhausted);
    }
}

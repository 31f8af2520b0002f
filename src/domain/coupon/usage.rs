//! Coupon usage record.

use serde::Serialize;

use super::CouponQuote;
use crate::domain::foundation::{CouponId, CouponUsageId, PaymentIntentId, Timestamp, UserId};

/// One application of a coupon by one user.
///
/// Paid purchases write it in the same transaction that creates the
/// intent, with at most one usage per intent. Free enrollments have no
/// intent and write it together with the enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponUsage {
    pub id: CouponUsageId,
    pub coupon_id: CouponId,
    pub user_id: UserId,
    pub payment_intent_id: Option<PaymentIntentId>,
    pub original_price: i64,
    pub discount_applied: i64,
    pub final_price: i64,
    pub used_at: Timestamp,
}

impl CouponUsage {
    pub fn from_quote(quote: &CouponQuote, user_id: UserId, payment_intent_id: PaymentIntentId) -> Self {
        Self {
            id: CouponUsageId::new(),
            coupon_id: quote.coupon_id,
            user_id,
            payment_intent_id: Some(payment_intent_id),
            original_price: quote.original_price,
            discount_applied: quote.discount,
            final_price: quote.final_price,
            used_at: Timestamp::now(),
        }
    }

    /// Usage for a zero-priced enrollment that never reaches the gateway.
    pub fn for_free_enrollment(quote: &CouponQuote, user_id: UserId) -> Self {
        Self {
            id: CouponUsageId::new(),
            coupon_id: quote.coupon_id,
            user_id,
            payment_intent_id: None,
            original_price: quote.original_price,
            discount_applied: quote.discount,
            final_price: quote.final_price,
            used_at: Timestamp::now(),
        }
    }
}

//! Coupon lookup port.

use async_trait::async_trait;

use crate::domain::coupon::{Coupon, CouponCode, CouponUsage};
use crate::domain::foundation::{CouponId, DomainError, PaymentIntentId, UserId};

/// Read side of the coupon ledger.
///
/// Usage rows are written together with their intent through
/// [`super::PaymentIntentRepository::create`].
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError>;

    /// True if `user_id` already has a usage row for this coupon.
    async fn has_user_used(&self, coupon_id: CouponId, user_id: &UserId) -> Result<bool, DomainError>;

    async fn find_usage_by_intent(
        &self,
        intent_id: PaymentIntentId,
    ) -> Result<Option<CouponUsage>, DomainError>;
}

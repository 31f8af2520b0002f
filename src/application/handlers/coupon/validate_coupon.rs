//! ValidateCouponHandler - Query handler for pricing a coupon code.

use std::sync::Arc;

use crate::domain::coupon::{CouponCode, CouponQuote, CouponRejection};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::CouponRepository;

/// Query to check a coupon against a purchase amount.
#[derive(Debug, Clone)]
pub struct ValidateCouponQuery {
    pub code: String,
    pub user_id: UserId,
    /// Whole currency units before discount.
    pub amount: i64,
}

/// Outcome of a coupon check. Rejections are answers, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponValidation {
    Valid(CouponQuote),
    Invalid(CouponRejection),
}

impl CouponValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, CouponValidation::Valid(_))
    }
}

/// Handler for coupon validation.
///
/// Read-only: nothing is reserved until a payment intent is created.
pub struct ValidateCouponHandler {
    coupons: Arc<dyn CouponRepository>,
}

impl ValidateCouponHandler {
    pub fn new(coupons: Arc<dyn CouponRepository>) -> Self {
        Self { coupons }
    }

    pub async fn handle(&self, query: ValidateCouponQuery) -> Result<CouponValidation, DomainError> {
        let result = quote_for_user(
            self.coupons.as_ref(),
            &query.code,
            &query.user_id,
            query.amount,
            Timestamp::now(),
        )
        .await?;

        Ok(match result {
            Ok(quote) => CouponValidation::Valid(quote),
            Err(reason) => {
                tracing::debug!(code = %query.code, user_id = %query.user_id, %reason, "Coupon rejected");
                CouponValidation::Invalid(reason)
            }
        })
    }
}

/// Prices `raw_code` for `user_id`, including the once-per-user rule.
///
/// The outer `Result` carries storage failures; the inner one is the
/// coupon verdict.
pub(crate) async fn quote_for_user(
    coupons: &dyn CouponRepository,
    raw_code: &str,
    user_id: &UserId,
    amount: i64,
    now: Timestamp,
) -> Result<Result<CouponQuote, CouponRejection>, DomainError> {
    let Ok(code) = CouponCode::try_new(raw_code) else {
        return Ok(Err(CouponRejection::NotFound));
    };

    let Some(coupon) = coupons.find_by_code(&code).await? else {
        return Ok(Err(CouponRejection::NotFound));
    };

    let quote = match coupon.quote(amount, now) {
        Ok(quote) => quote,
        Err(reason) => return Ok(Err(reason)),
    };

    if coupons.has_user_used(coupon.id, user_id).await? {
        return Ok(Err(CouponRejection::AlreadyUsed));
    }

    Ok(Ok(quote))
}

//! Coupon definition and discount computation.

use serde::{Deserialize, Serialize};

use super::{CouponCode, CouponRejection};
use crate::domain::foundation::{CouponId, Timestamp, ValidationError};
use crate::domain::payment::MAX_PURCHASE_AMOUNT;

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Whole percent of the purchase amount (1..=100).
    Percentage,
    /// Flat amount in whole currency units.
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        }
    }
}

impl std::str::FromStr for DiscountType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountType::Percentage),
            "fixed" => Ok(DiscountType::Fixed),
            other => Err(ValidationError::invalid_format(
                "discount_type",
                format!("unknown discount type '{}'", other),
            )),
        }
    }
}

/// A discount code and the rules that govern it.
///
/// The rule table is maintained outside this service; coupons are only
/// read, priced and counted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coupon {
    pub id: CouponId,
    pub code: CouponCode,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    /// Upper bound on the computed discount, if any.
    pub max_discount: Option<i64>,
    pub min_purchase_amount: Option<i64>,
    pub usage_count: i32,
    /// `None` means unlimited.
    pub usage_limit: Option<i32>,
    pub valid_from: Option<Timestamp>,
    pub valid_until: Option<Timestamp>,
    pub is_active: bool,
}

/// The priced result of applying a valid coupon to an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponQuote {
    pub coupon_id: CouponId,
    pub code: CouponCode,
    pub original_price: i64,
    pub discount: i64,
    pub final_price: i64,
}

impl Coupon {
    /// True while the usage counter is below its limit.
    pub fn has_remaining_uses(&self) -> bool {
        match self.usage_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }

    /// Checks every rule and prices the discount, failing closed.
    ///
    /// Any doubt yields a rejection; a partial discount is never returned.
    pub fn quote(&self, amount: i64, now: Timestamp) -> Result<CouponQuote, CouponRejection> {
        if !(1..=MAX_PURCHASE_AMOUNT).contains(&amount) {
            return Err(CouponRejection::InvalidAmount);
        }
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if let Some(from) = self.valid_from {
            if now.is_before(&from) {
                return Err(CouponRejection::NotYetValid);
            }
        }
        if let Some(until) = self.valid_until {
            if now.is_after(&until) {
                return Err(CouponRejection::Expired);
            }
        }
        if !self.has_remaining_uses() {
            return Err(CouponRejection::Exhausted);
        }
        if let Some(minimum) = self.min_purchase_amount {
            if amount < minimum {
                return Err(CouponRejection::BelowMinimum { minimum });
            }
        }

        let discount = self.discount_for(amount)?;
        Ok(CouponQuote {
            coupon_id: self.id,
            code: self.code.clone(),
            original_price: amount,
            discount,
            final_price: amount - discount,
        })
    }

    fn discount_for(&self, amount: i64) -> Result<i64, CouponRejection> {
        let raw = match self.discount_type {
            DiscountType::Percentage => {
                if !(1..=100).contains(&self.discount_value) {
                    return Err(CouponRejection::Misconfigured);
                }
                amount * self.discount_value / 100
            }
            DiscountType::Fixed => {
                if self.discount_value <= 0 {
                    return Err(CouponRejection::Misconfigured);
                }
                self.discount_value
            }
        };

        let capped = match self.max_discount {
            Some(cap) if cap < 0 => return Err(CouponRejection::Misconfigured),
            Some(cap) => raw.min(cap),
            None => raw,
        };
        Ok(capped.min(amount))
    }
}

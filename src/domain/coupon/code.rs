//! Coupon code value object.

use crate::domain::foundation::ValidationError;
use serde::{Deserialize, Serialize};

const MAX_CODE_LEN: usize = 32;

/// A coupon code as typed by a customer, normalized to uppercase.
///
/// Codes are matched case-insensitively, so `launch500` and `LAUNCH500`
/// name the same coupon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CouponCode(String);

impl CouponCode {
    pub fn try_new(code: &str) -> Result<Self, ValidationError> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("coupon_code"));
        }
        if trimmed.len() > MAX_CODE_LEN {
            return Err(ValidationError::out_of_range(
                "coupon_code_length",
                1,
                MAX_CODE_LEN as i64,
                trimmed.len() as i64,
            ));
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::invalid_format(
                "coupon_code",
                "letters, digits, '-' and '_' only",
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CouponCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CouponCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_new(&value)
    }
}

impl From<CouponCode> for String {
    fn from(code: CouponCode) -> Self {
        code.0
    }
}

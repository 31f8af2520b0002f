//! Payment providers.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

/// The external gateway that owns an intent's remote payment request.
///
/// Each intent belongs to exactly one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Razorpay,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Razorpay => "razorpay",
        }
    }
}

impl std::str::FromStr for Provider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "razorpay" => Ok(Provider::Razorpay),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unsupported provider '{}'", other),
            )),
        }
    }
}

/// Largest purchase amount accepted, in whole currency units.
///
/// Keeps every price, discount and minor-unit computation far from `i64`
/// overflow.
pub const MAX_PURCHASE_AMOUNT: i64 = 10_000_000;

/// Converts whole currency units to the gateway's minor units (paise).
pub fn to_minor_units(amount: i64) -> i64 {
    amount.saturating_mul(100)
}

/// Checks whether a captured minor-unit amount is within `tolerance_bps`
/// basis points of an intent's whole-unit amount.
///
/// Comparison happens in minor units so fractional captures are not
/// rounded away.
pub fn amount_matches(intent_amount: i64, captured_minor: i64, tolerance_bps: u32) -> bool {
    let expected = to_minor_units(intent_amount);
    let allowed = expected.saturating_mul(i64::from(tolerance_bps)) / 10_000;
    captured_minor.abs_diff(expected) <= allowed.unsigned_abs()
}

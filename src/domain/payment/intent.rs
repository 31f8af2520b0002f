//! PaymentIntent aggregate.

use serde::Serialize;

use super::{CheckoutError, PaymentStatus, Provider, TransitionOutcome, MAX_PURCHASE_AMOUNT};
use crate::domain::foundation::{
    CouponId, PaymentIntentId, StateMachine, Timestamp, UserId, ValidationError,
};

/// Supported currency for intents. Multi-currency settlement is out of scope.
pub const DEFAULT_CURRENCY: &str = "INR";

/// This service's own record of one purchase attempt.
///
/// Distinct from the gateway's record of the same attempt: the id is
/// minted here and the gateway's identifiers are attached as they become
/// known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentIntent {
    id: PaymentIntentId,
    user_id: UserId,
    /// Whole currency units (e.g. rupees), after any coupon discount.
    amount: i64,
    currency: String,
    provider: Provider,
    provider_order_id: Option<String>,
    provider_payment_id: Option<String>,
    coupon_id: Option<CouponId>,
    /// Payer email given at checkout, lowercased. Used only by the
    /// degraded webhook matching path.
    customer_email: Option<String>,
    status: PaymentStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl PaymentIntent {
    /// Creates a new pending intent.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the amount is outside
    /// `1..=MAX_PURCHASE_AMOUNT` or the currency is blank.
    pub fn new(
        id: PaymentIntentId,
        user_id: UserId,
        amount: i64,
        currency: impl Into<String>,
        provider: Provider,
    ) -> Result<Self, ValidationError> {
        if !(1..=MAX_PURCHASE_AMOUNT).contains(&amount) {
            return Err(ValidationError::out_of_range("amount", 1, MAX_PURCHASE_AMOUNT, amount));
        }
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id,
            user_id,
            amount,
            currency: currency.to_ascii_uppercase(),
            provider,
            provider_order_id: None,
            provider_payment_id: None,
            coupon_id: None,
            customer_email: None,
            status: PaymentStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds an intent from storage without re-running validation.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: PaymentIntentId,
        user_id: UserId,
        amount: i64,
        currency: String,
        provider: Provider,
        provider_order_id: Option<String>,
        provider_payment_id: Option<String>,
        coupon_id: Option<CouponId>,
        customer_email: Option<String>,
        status: PaymentStatus,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            currency,
            provider,
            provider_order_id,
            provider_payment_id,
            coupon_id,
            customer_email,
            status,
            created_at,
            updated_at,
        }
    }

    /// Records the gateway's identifier for the remote payment request.
    ///
    /// Allowed once, while pending.
    pub fn attach_provider_order(
        &mut self,
        provider_order_id: impl Into<String>,
    ) -> Result<(), CheckoutError> {
        if self.status != PaymentStatus::Pending {
            return Err(CheckoutError::invalid_state(
                self.status.as_str(),
                "attach_provider_order",
            ));
        }
        if self.provider_order_id.is_some() {
            return Err(CheckoutError::invalid_state(
                "provider_order_attached",
                "attach_provider_order",
            ));
        }
        let provider_order_id = provider_order_id.into();
        if provider_order_id.trim().is_empty() {
            return Err(CheckoutError::validation(
                "provider_order_id",
                "cannot be empty",
            ));
        }
        self.provider_order_id = Some(provider_order_id);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Notes which coupon priced this intent.
    pub fn with_coupon(mut self, coupon_id: CouponId) -> Self {
        self.coupon_id = Some(coupon_id);
        self
    }

    pub fn with_customer_email(mut self, email: &str) -> Self {
        let email = email.trim();
        if !email.is_empty() {
            self.customer_email = Some(email.to_ascii_lowercase());
        }
        self
    }

    /// In-place compare-and-set to `Completed`.
    ///
    /// Storage adapters that hold intents in memory call this under their
    /// lock; SQL adapters express the same rule as a conditional UPDATE.
    pub fn complete(&mut self, provider_payment_id: impl Into<String>, at: Timestamp) -> TransitionOutcome {
        if !self.status.can_transition_to(&PaymentStatus::Completed) {
            return TransitionOutcome::AlreadyTerminal(self.status);
        }
        self.status = PaymentStatus::Completed;
        self.provider_payment_id = Some(provider_payment_id.into());
        self.updated_at = at;
        TransitionOutcome::Applied
    }

    /// In-place compare-and-set to `Failed`.
    pub fn fail(&mut self, at: Timestamp) -> TransitionOutcome {
        if !self.status.can_transition_to(&PaymentStatus::Failed) {
            return TransitionOutcome::AlreadyTerminal(self.status);
        }
        self.status = PaymentStatus::Failed;
        self.updated_at = at;
        TransitionOutcome::Applied
    }

    /// Returns an error unless `user_id` owns this intent.
    pub fn ensure_owned_by(&self, user_id: &UserId) -> Result<(), CheckoutError> {
        if &self.user_id != user_id {
            return Err(CheckoutError::Forbidden);
        }
        Ok(())
    }

    pub fn id(&self) -> PaymentIntentId {
        self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn provider_order_id(&self) -> Option<&str> {
        self.provider_order_id.as_deref()
    }

    pub fn provider_payment_id(&self) -> Option<&str> {
        self.provider_payment_id.as_deref()
    }

    pub fn coupon_id(&self) -> Option<CouponId> {
        self.coupon_id
    }

    pub fn customer_email(&self) -> Option<&str> {
        self.customer_email.as_deref()
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_intent() -> PaymentIntent {
        PaymentIntent::new(
            PaymentIntentId::new(),
            UserId::new("user-1").unwrap(),
            999,
            "inr",
            Provider::Razorpay,
        )
        .unwrap()
    }

    #[test]
    fn new_intent_is_pending_without_gateway_ids() {
        let intent = pending_intent();
        assert_eq!(intent.status(), PaymentStatus::Pending);
        assert_eq!(intent.currency(), "INR");
        assert!(intent.provider_order_id().is_none());
        assert!(intent.provider_payment_id().is_none());
    }

    #[test]
    fn zero_amount_is_rejected() {
        let result = PaymentIntent::new(
            PaymentIntentId::new(),
            UserId::new("user-1").unwrap(),
            0,
            DEFAULT_CURRENCY,
            Provider::Razorpay,
        );
        assert!(result.is_err());
    }

    #[test]
    fn provider_order_attaches_once() {
        let mut intent = pending_intent();
        intent.attach_provider_order("plink_123").unwrap();
        assert_eq!(intent.provider_order_id(), Some("plink_123"));

        let second = intent.attach_provider_order("plink_456");
        assert!(matches!(second, Err(CheckoutError::InvalidState { .. })));
        assert_eq!(intent.provider_order_id(), Some("plink_123"));
    }

    #[test]
    fn complete_applies_only_once() {
        let mut intent = pending_intent();
        let first = intent.complete("pay_1", Timestamp::now());
        let second = intent.complete("pay_2", Timestamp::now());

        assert_eq!(first, TransitionOutcome::Applied);
        assert_eq!(
            second,
            TransitionOutcome::AlreadyTerminal(PaymentStatus::Completed)
        );
        assert_eq!(intent.provider_payment_id(), Some("pay_1"));
    }

    #[test]
    fn failed_intent_cannot_complete() {
        let mut intent = pending_intent();
        assert!(intent.fail(Timestamp::now()).is_applied());
        let outcome = intent.complete("pay_late", Timestamp::now());
        assert_eq!(outcome, TransitionOutcome::AlreadyTerminal(PaymentStatus::Failed));
        assert!(intent.provider_payment_id().is_none());
    }

    #[test]
    fn customer_email_is_normalized() {
        let intent = pending_intent().with_customer_email("  Jane@X.com ");
        assert_eq!(intent.customer_email(), Some("jane@x.com"));
        assert!(pending_intent().with_customer_email("").customer_email().is_none());
    }

    #[test]
    fn ownership_check_rejects_other_users() {
        let intent = pending_intent();
        assert!(intent.ensure_owned_by(&UserId::new("user-1").unwrap()).is_ok());
        assert_eq!(
            intent.ensure_owned_by(&UserId::new("intruder").unwrap()),
            Err(CheckoutError::Forbidden)
        );
    }
}

//! Payment intent persistence port.

use async_trait::async_trait;

use crate::domain::coupon::CouponUsage;
use crate::domain::foundation::{DomainError, PaymentIntentId, Timestamp};
use crate::domain::payment::{PaymentIntent, TransitionOutcome};

/// Durable store of payment intents.
///
/// The two `transition_*` methods are the only status writers. Each must be
/// a single atomic conditional update on `status = 'pending'`, never a
/// read followed by a write.
#[async_trait]
pub trait PaymentIntentRepository: Send + Sync {
    /// Persists a new pending intent and, if present, its coupon usage.
    ///
    /// Both rows are written in one transaction. The coupon's usage counter
    /// is incremented only while it is below its limit; if that condition
    /// fails nothing is written and `ErrorCode::CouponExhausted` is
    /// returned. A second usage of the same coupon by the same user fails
    /// with `ErrorCode::DuplicateCouponUsage`.
    async fn create(
        &self,
        intent: &PaymentIntent,
        coupon_usage: Option<&CouponUsage>,
    ) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError>;

    /// Canonical lookup for the redirect callback.
    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentIntent>, DomainError>;

    /// Pending intents created at or after `since` whose checkout email
    /// equals `email`, ignoring case.
    async fn find_pending_by_email_since(
        &self,
        email: &str,
        since: Timestamp,
    ) -> Result<Vec<PaymentIntent>, DomainError>;

    /// Compare-and-set pending → completed.
    async fn transition_to_completed(
        &self,
        id: PaymentIntentId,
        provider_payment_id: &str,
    ) -> Result<TransitionOutcome, DomainError>;

    /// Compare-and-set pending → failed.
    async fn transition_to_failed(&self, id: PaymentIntentId) -> Result<TransitionOutcome, DomainError>;
}

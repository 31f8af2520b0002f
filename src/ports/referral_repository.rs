//! Referral persistence port.

use async_trait::async_trait;

use crate::domain::enrollment::{EnrollmentType, Referral, ReferralReward};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Referrals and the rewards they produce.
#[async_trait]
pub trait ReferralRepository: Send + Sync {
    async fn find_by_referee(&self, referee_id: &UserId) -> Result<Option<Referral>, DomainError>;

    /// Moves the referee's referral out of `pending` and records the reward.
    ///
    /// The status change is conditional on the referral still being
    /// pending, and the reward row is written in the same transaction.
    /// Returns `None` when there is no pending referral, so concurrent
    /// callers award at most once.
    async fn advance_if_pending(
        &self,
        referee_id: &UserId,
        kind: EnrollmentType,
        paid_points: i32,
        at: Timestamp,
    ) -> Result<Option<ReferralReward>, DomainError>;

    async fn rewards_for_referrer(&self, referrer_id: &UserId) -> Result<Vec<ReferralReward>, DomainError>;
}

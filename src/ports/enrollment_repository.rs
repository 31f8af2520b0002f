//! Enrollment (profile) persistence port.

use async_trait::async_trait;

use crate::domain::coupon::CouponUsage;
use crate::domain::enrollment::{CohortWindow, Enrollment};
use crate::domain::foundation::{DomainError, UserId};

/// Enrollment fields on user profiles.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Current enrollment for a user; not-enrolled if the profile has none.
    async fn get(&self, user_id: &UserId) -> Result<Enrollment, DomainError>;

    /// Sets `enrolled = true` and overwrites the cohort window.
    ///
    /// Callers guarantee this runs once per first completion.
    async fn open_window(&self, user_id: &UserId, window: CohortWindow) -> Result<(), DomainError>;

    /// Enrolls a user by redeeming a coupon that covers the whole price.
    ///
    /// One atomic step: the window is written only if the user is not yet
    /// enrolled, the coupon counter is incremented only while below its
    /// limit, and `usage` is recorded. Returns `false` without writing
    /// anything when the user is already enrolled. Fails with
    /// `ErrorCode::CouponExhausted` or `ErrorCode::DuplicateCouponUsage`,
    /// again writing nothing, when the coupon cannot be redeemed.
    async fn enroll_with_coupon(
        &self,
        user_id: &UserId,
        window: CohortWindow,
        usage: &CouponUsage,
    ) -> Result<bool, DomainError>;
}

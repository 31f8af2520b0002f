//! CompleteFreeEnrollmentHandler - Enrolls a user whose purchase is fully discounted.

use std::sync::Arc;

use crate::application::handlers::coupon::quote_for_user;
use crate::domain::coupon::CouponUsage;
use crate::domain::enrollment::{Enrollment, EnrollmentType};
use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::payment::CheckoutError;
use crate::ports::{CouponRepository, EnrollmentRepository};

use super::{EnrollmentProjector, ProjectionReport};

/// Command to enroll without a gateway payment.
#[derive(Debug, Clone)]
pub struct CompleteFreeEnrollmentCommand {
    pub user_id: UserId,
    /// Coupon that brings `amount` to zero.
    pub coupon_code: String,
    /// List price in whole currency units.
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub enum CompleteFreeEnrollmentResult {
    /// The user was enrolled by this call.
    Enrolled {
        enrollment: Enrollment,
        report: ProjectionReport,
    },
    /// The user was already enrolled; no coupon use was consumed.
    AlreadyEnrolled(Enrollment),
}

/// Handler for zero-priced enrollment.
///
/// The coupon must cover the whole price; anything less goes through
/// the gateway instead. Redeeming the coupon and opening the window are a
/// single conditional write, so concurrent requests enroll once and
/// consume one use.
pub struct CompleteFreeEnrollmentHandler {
    coupons: Arc<dyn CouponRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
    projector: Arc<EnrollmentProjector>,
}

impl CompleteFreeEnrollmentHandler {
    pub fn new(
        coupons: Arc<dyn CouponRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
        projector: Arc<EnrollmentProjector>,
    ) -> Self {
        Self {
            coupons,
            enrollments,
            projector,
        }
    }

    pub async fn handle(
        &self,
        cmd: CompleteFreeEnrollmentCommand,
    ) -> Result<CompleteFreeEnrollmentResult, CheckoutError> {
        let current = self.enrollments.get(&cmd.user_id).await?;
        if current.enrolled {
            return Ok(CompleteFreeEnrollmentResult::AlreadyEnrolled(current));
        }

        let now = Timestamp::now();
        let quote = quote_for_user(
            self.coupons.as_ref(),
            &cmd.coupon_code,
            &cmd.user_id,
            cmd.amount,
            now,
        )
        .await??;
        if quote.final_price != 0 {
            return Err(CheckoutError::validation(
                "coupon_code",
                "coupon does not cover the full price",
            ));
        }

        let window = self.projector.window_starting_at(now)?;
        let usage = CouponUsage::for_free_enrollment(&quote, cmd.user_id.clone());
        if !self
            .enrollments
            .enroll_with_coupon(&cmd.user_id, window, &usage)
            .await?
        {
            let current = self.enrollments.get(&cmd.user_id).await?;
            return Ok(CompleteFreeEnrollmentResult::AlreadyEnrolled(current));
        }

        let mut report = ProjectionReport {
            window: Some(window),
            ..ProjectionReport::default()
        };
        self.projector
            .advance_referral(&cmd.user_id, EnrollmentType::Free, now, &mut report)
            .await;

        tracing::info!(user_id = %cmd.user_id, coupon = %quote.code.as_str(), "Free enrollment completed");

        let enrollment = self.enrollments.get(&cmd.user_id).await?;
        Ok(CompleteFreeEnrollmentResult::Enrolled { enrollment, report })
    }
}

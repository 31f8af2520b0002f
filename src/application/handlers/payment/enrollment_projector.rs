//! EnrollmentProjector - Side effects of a first completion.
//!
//! Runs only after the caller has won the pending → completed transition.
//! Free enrollments write their own window and reuse the referral step. Each step is logged and
//! its failure is reported, never propagated: a captured payment is not
//! undone because a projection failed.

use std::sync::Arc;

use crate::domain::enrollment::{CohortWindow, EnrollmentType, ReferralReward};
use crate::domain::foundation::{Timestamp, UserId, ValidationError};
use crate::ports::{EnrollmentRepository, ReferralRepository};

/// What the projection managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionReport {
    /// The window written to the profile, if the write succeeded.
    pub window: Option<CohortWindow>,
    /// The reward granted to a referrer, if a pending referral advanced.
    pub reward: Option<ReferralReward>,
    /// Steps that failed and need manual reconciliation.
    pub failed_steps: Vec<&'static str>,
}

impl ProjectionReport {
    pub fn is_complete(&self) -> bool {
        self.failed_steps.is_empty()
    }

    pub fn points_awarded(&self) -> i32 {
        self.reward.as_ref().map(|r| r.points_earned).unwrap_or(0)
    }
}

/// Opens the cohort window and advances the referral.
pub struct EnrollmentProjector {
    enrollments: Arc<dyn EnrollmentRepository>,
    referrals: Arc<dyn ReferralRepository>,
    cohort_length_days: u32,
    referral_paid_points: i32,
}

impl EnrollmentProjector {
    pub fn new(
        enrollments: Arc<dyn EnrollmentRepository>,
        referrals: Arc<dyn ReferralRepository>,
        cohort_length_days: u32,
        referral_paid_points: i32,
    ) -> Self {
        Self {
            enrollments,
            referrals,
            cohort_length_days,
            referral_paid_points,
        }
    }

    /// Applies the enrollment window, then the referral transition.
    ///
    /// Callers guarantee this runs at most once per completion; the window
    /// is overwritten unconditionally.
    pub async fn project(&self, user_id: &UserId, kind: EnrollmentType, at: Timestamp) -> ProjectionReport {
        let mut report = ProjectionReport::default();

        match self.window_starting_at(at) {
            Ok(window) => match self.enrollments.open_window(user_id, window).await {
                Ok(()) => {
                    tracing::info!(
                        user_id = %user_id,
                        cohort_end = %window.end().as_datetime(),
                        "Enrollment window opened"
                    );
                    report.window = Some(window);
                }
                Err(e) => {
                    tracing::error!(user_id = %user_id, error = %e, "Failed to open enrollment window; needs manual reconciliation");
                    report.failed_steps.push("enrollment_window");
                }
            },
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Invalid cohort length");
                report.failed_steps.push("enrollment_window");
            }
        }

        self.advance_referral(user_id, kind, at, &mut report).await;
        report
    }

    /// Moves a pending referral forward and records any reward in `report`.
    ///
    /// Free enrollments open their window together with the coupon
    /// redemption and only need this step.
    pub async fn advance_referral(
        &self,
        user_id: &UserId,
        kind: EnrollmentType,
        at: Timestamp,
        report: &mut ProjectionReport,
    ) {
        match self
            .referrals
            .advance_if_pending(user_id, kind, self.referral_paid_points, at)
            .await
        {
            Ok(Some(reward)) => {
                tracing::info!(
                    referee_id = %user_id,
                    referrer_id = %reward.user_id,
                    points = reward.points_earned,
                    "Referral advanced"
                );
                report.reward = Some(reward);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(referee_id = %user_id, error = %e, "Failed to advance referral; needs manual reconciliation");
                report.failed_steps.push("referral");
            }
        }
    }

    /// Cohort window for an enrollment starting at `at`.
    pub fn window_starting_at(&self, at: Timestamp) -> Result<CohortWindow, ValidationError> {
        CohortWindow::starting_at(at, self.cohort_length_days)
    }
}

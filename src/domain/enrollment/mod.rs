//! Enrollment and referral projections of a completed payment.

mod cohort;
mod referral;

pub use cohort::{CohortWindow, Enrollment, EnrollmentType};
pub use referral::{Referral, ReferralReward, ReferralStatus};

//! Referral lifecycle and rewards.

use serde::{Deserialize, Serialize};

use super::EnrollmentType;
use crate::domain::foundation::{
    ReferralId, ReferralRewardId, StateMachine, Timestamp, UserId, ValidationError,
};

/// Referral status as stored.
///
/// A referral starts `Pending` and ends in exactly one of the other three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    EnrolledFree,
    EnrolledPaid,
    Cancelled,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::EnrolledFree => "enrolled_free",
            ReferralStatus::EnrolledPaid => "enrolled_paid",
            ReferralStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal status reached when the referee enrolls.
    pub fn for_enrollment(kind: EnrollmentType) -> Self {
        match kind {
            EnrollmentType::Paid => ReferralStatus::EnrolledPaid,
            EnrollmentType::Free => ReferralStatus::EnrolledFree,
        }
    }
}

impl std::str::FromStr for ReferralStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReferralStatus::Pending),
            "enrolled_free" => Ok(ReferralStatus::EnrolledFree),
            "enrolled_paid" => Ok(ReferralStatus::EnrolledPaid),
            "cancelled" => Ok(ReferralStatus::Cancelled),
            other => Err(ValidationError::invalid_format(
                "referral_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for ReferralStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ReferralStatus::*;
        matches!(
            (self, target),
            (Pending, EnrolledFree) | (Pending, EnrolledPaid) | (Pending, Cancelled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ReferralStatus::*;
        match self {
            Pending => vec![EnrolledFree, EnrolledPaid, Cancelled],
            EnrolledFree | EnrolledPaid | Cancelled => vec![],
        }
    }
}

/// One referrer/referee pair. Each referee has at most one referral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Referral {
    pub id: ReferralId,
    pub referrer_id: UserId,
    pub referee_id: UserId,
    pub referral_code: String,
    pub status: ReferralStatus,
    pub points_awarded: i32,
    pub enrolled_at: Option<Timestamp>,
}

impl Referral {
    pub fn pending(referrer_id: UserId, referee_id: UserId, referral_code: impl Into<String>) -> Self {
        Self {
            id: ReferralId::new(),
            referrer_id,
            referee_id,
            referral_code: referral_code.into(),
            status: ReferralStatus::Pending,
            points_awarded: 0,
            enrolled_at: None,
        }
    }

    /// Moves a pending referral to its enrolled state.
    ///
    /// Returns the reward to grant the referrer, or `None` if the referral
    /// had already left `Pending`. Free enrollments advance the status but
    /// grant no points.
    pub fn mark_enrolled(
        &mut self,
        kind: EnrollmentType,
        paid_points: i32,
        at: Timestamp,
    ) -> Option<ReferralReward> {
        let target = ReferralStatus::for_enrollment(kind);
        if !self.status.can_transition_to(&target) {
            return None;
        }
        let points = match kind {
            EnrollmentType::Paid => paid_points,
            EnrollmentType::Free => 0,
        };
        self.status = target;
        self.enrolled_at = Some(at);
        self.points_awarded = points;
        Some(ReferralReward {
            id: ReferralRewardId::new(),
            user_id: self.referrer_id.clone(),
            referral_id: self.id,
            points_earned: points,
            reason: format!("Referral {}", target.as_str()),
            created_at: at,
        })
    }
}

/// Points granted to a referrer when their referee enrolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferralReward {
    pub id: ReferralRewardId,
    pub user_id: UserId,
    pub referral_id: ReferralId,
    pub points_earned: i32,
    pub reason: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn referral() -> Referral {
        Referral::pending(
            UserId::new("referrer").unwrap(),
            UserId::new("referee").unwrap(),
            "FRIEND-42",
        )
    }

    #[test]
    fn paid_enrollment_grants_points_once() {
        let mut r = referral();
        let now = Timestamp::now();

        let reward = r.mark_enrolled(EnrollmentType::Paid, 100, now).unwrap();
        assert_eq!(reward.points_earned, 100);
        assert_eq!(reward.user_id.as_str(), "referrer");
        assert_eq!(r.status, ReferralStatus::EnrolledPaid);
        assert_eq!(r.enrolled_at, Some(now));

        assert!(r.mark_enrolled(EnrollmentType::Paid, 100, now).is_none());
        assert_eq!(r.points_awarded, 100);
    }

    #[test]
    fn free_enrollment_advances_without_points() {
        let mut r = referral();
        let reward = r
            .mark_enrolled(EnrollmentType::Free, 100, Timestamp::now())
            .unwrap();
        assert_eq!(reward.points_earned, 0);
        assert_eq!(r.status, ReferralStatus::EnrolledFree);
    }

    #[test]
    fn cancelled_referral_is_never_advanced() {
        let mut r = referral();
        r.status = ReferralStatus::Cancelled;
        assert!(r
            .mark_enrolled(EnrollmentType::Paid, 100, Timestamp::now())
            .is_none());
        assert_eq!(r.status, ReferralStatus::Cancelled);
    }

    #[test]
    fn status_parses_snake_case() {
        assert_eq!(
            "enrolled_paid".parse::<ReferralStatus>().unwrap(),
            ReferralStatus::EnrolledPaid
        );
        assert!("paid".parse::<ReferralStatus>().is_err());
    }
}

//! PostgreSQL implementation of ReferralRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::enrollment::{EnrollmentType, Referral, ReferralReward, ReferralStatus};
use crate::domain::foundation::{
    DomainError, ErrorCode, ReferralId, ReferralRewardId, Timestamp, UserId,
};
use crate::ports::ReferralRepository;

use super::db_error;

pub struct PostgresReferralRepository {
    pool: PgPool,
}

impl PostgresReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReferralRow {
    id: Uuid,
    referrer_id: String,
    referee_id: String,
    referral_code: String,
    status: String,
    points_awarded: i32,
    enrolled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct RewardRow {
    id: Uuid,
    user_id: String,
    referral_id: Uuid,
    points_earned: i32,
    reason: String,
    created_at: DateTime<Utc>,
}

fn corrupt(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid referral row: {}", e))
}

impl TryFrom<ReferralRow> for Referral {
    type Error = DomainError;

    fn try_from(row: ReferralRow) -> Result<Self, Self::Error> {
        Ok(Referral {
            id: ReferralId::from_uuid(row.id),
            referrer_id: UserId::new(row.referrer_id).map_err(corrupt)?,
            referee_id: UserId::new(row.referee_id).map_err(corrupt)?,
            referral_code: row.referral_code,
            status: row.status.parse::<ReferralStatus>().map_err(corrupt)?,
            points_awarded: row.points_awarded,
            enrolled_at: row.enrolled_at.map(Timestamp::from_datetime),
        })
    }
}

impl TryFrom<RewardRow> for ReferralReward {
    type Error = DomainError;

    fn try_from(row: RewardRow) -> Result<Self, Self::Error> {
        Ok(ReferralReward {
            id: ReferralRewardId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt)?,
            referral_id: ReferralId::from_uuid(row.referral_id),
            points_earned: row.points_earned,
            reason: row.reason,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

#[async_trait]
impl ReferralRepository for PostgresReferralRepository {
    async fn find_by_referee(&self, referee_id: &UserId) -> Result<Option<Referral>, DomainError> {
        let row: Option<ReferralRow> = sqlx::query_as(
            r#"
            SELECT id, referrer_id, referee_id, referral_code, status, points_awarded, enrolled_at
            FROM referrals WHERE referee_id = $1
            "#,
        )
        .bind(referee_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch referral"))?;

        row.map(Referral::try_from).transpose()
    }

    async fn advance_if_pending(
        &self,
        referee_id: &UserId,
        kind: EnrollmentType,
        paid_points: i32,
        at: Timestamp,
    ) -> Result<Option<ReferralReward>, DomainError> {
        let target = ReferralStatus::for_enrollment(kind);
        let points = match kind {
            EnrollmentType::Paid => paid_points,
            EnrollmentType::Free => 0,
        };

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let advanced: Option<(Uuid, String)> = sqlx::query_as(
            r#"
            UPDATE referrals
            SET status = $2, points_awarded = $3, enrolled_at = $4
            WHERE referee_id = $1 AND status = 'pending'
            RETURNING id, referrer_id
            "#,
        )
        .bind(referee_id.as_str())
        .bind(target.as_str())
        .bind(points)
        .bind(at.as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to advance referral"))?;

        let Some((referral_id, referrer_id)) = advanced else {
            return Ok(None);
        };

        let reward = ReferralReward {
            id: ReferralRewardId::new(),
            user_id: UserId::new(referrer_id).map_err(corrupt)?,
            referral_id: ReferralId::from_uuid(referral_id),
            points_earned: points,
            reason: format!("Referral {}", target.as_str()),
            created_at: at,
        };

        sqlx::query(
            r#"
            INSERT INTO referral_rewards (id, user_id, referral_id, points_earned, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(reward.id.as_uuid())
        .bind(reward.user_id.as_str())
        .bind(reward.referral_id.as_uuid())
        .bind(reward.points_earned)
        .bind(&reward.reason)
        .bind(reward.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to record referral reward"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit referral advance"))?;

        Ok(Some(reward))
    }

    async fn rewards_for_referrer(&self, referrer_id: &UserId) -> Result<Vec<ReferralReward>, DomainError> {
        let rows: Vec<RewardRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, referral_id, points_earned, reason, created_at
            FROM referral_rewards WHERE user_id = $1 ORDER BY created_at
            "#,
        )
        .bind(referrer_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to fetch referral rewards"))?;

        rows.into_iter().map(ReferralReward::try_from).collect()
    }
}

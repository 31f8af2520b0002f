//! PostgreSQL implementation of EnrollmentRepository over `profiles`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::coupon::CouponUsage;
use crate::domain::enrollment::{CohortWindow, Enrollment};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::EnrollmentRepository;

use super::{db_error, increment_coupon_usage, insert_coupon_usage};

pub struct PostgresEnrollmentRepository {
    pool: PgPool,
}

impl PostgresEnrollmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    enrolled: bool,
    cohort_start: Option<DateTime<Utc>>,
    cohort_end: Option<DateTime<Utc>>,
}

#[async_trait]
impl EnrollmentRepository for PostgresEnrollmentRepository {
    async fn get(&self, user_id: &UserId) -> Result<Enrollment, DomainError> {
        let row: Option<ProfileRow> = sqlx::query_as(
            "SELECT enrolled, cohort_start, cohort_end FROM profiles WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch profile"))?;

        let Some(row) = row else {
            return Ok(Enrollment::not_enrolled(user_id.clone()));
        };

        let cohort = match (row.cohort_start, row.cohort_end) {
            (Some(start), Some(end)) => Some(CohortWindow::reconstitute(
                Timestamp::from_datetime(start),
                Timestamp::from_datetime(end),
            )),
            _ => None,
        };

        Ok(Enrollment {
            user_id: user_id.clone(),
            enrolled: row.enrolled,
            cohort,
        })
    }

    async fn open_window(&self, user_id: &UserId, window: CohortWindow) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, enrolled, cohort_start, cohort_end, updated_at)
            VALUES ($1, TRUE, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                enrolled = TRUE,
                cohort_start = EXCLUDED.cohort_start,
                cohort_end = EXCLUDED.cohort_end,
                updated_at = NOW()
            "#,
        )
        .bind(user_id.as_str())
        .bind(window.start().as_datetime())
        .bind(window.end().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to open enrollment window"))?;

        Ok(())
    }

    async fn enroll_with_coupon(
        &self,
        user_id: &UserId,
        window: CohortWindow,
        usage: &CouponUsage,
    ) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        // The upsert only touches profiles that are not enrolled yet and
        // holds the row lock until commit.
        let opened: Option<String> = sqlx::query_scalar(
            r#"
            INSERT INTO profiles (user_id, enrolled, cohort_start, cohort_end, updated_at)
            VALUES ($1, TRUE, $2, $3, NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                enrolled = TRUE,
                cohort_start = EXCLUDED.cohort_start,
                cohort_end = EXCLUDED.cohort_end,
                updated_at = NOW()
            WHERE NOT profiles.enrolled
            RETURNING user_id
            "#,
        )
        .bind(user_id.as_str())
        .bind(window.start().as_datetime())
        .bind(window.end().as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to open enrollment window"))?;

        if opened.is_none() {
            return Ok(false);
        }

        increment_coupon_usage(&mut tx, usage).await?;
        insert_coupon_usage(&mut tx, usage).await?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit free enrollment"))?;
        Ok(true)
    }
}

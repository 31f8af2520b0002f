//! PostgreSQL implementation of PaymentIntentRepository.
//!
//! Status changes are single conditional UPDATEs on `status = 'pending'`;
//! creation writes the intent, the coupon counter and the usage row in one
//! transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::coupon::CouponUsage;
use crate::domain::foundation::{
    CouponId, DomainError, ErrorCode, PaymentIntentId, Timestamp, UserId,
};
use crate::domain::payment::{PaymentIntent, PaymentStatus, TransitionOutcome};
use crate::ports::PaymentIntentRepository;

use super::{db_error, increment_coupon_usage, insert_coupon_usage};

/// PostgreSQL implementation of the PaymentIntentRepository port.
pub struct PostgresPaymentIntentRepository {
    pool: PgPool,
}

impl PostgresPaymentIntentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_status(&self, id: PaymentIntentId) -> Result<PaymentStatus, DomainError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM payments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to read payment status"))?;

        match status {
            Some(s) => parse_status(&s),
            None => Err(DomainError::new(
                ErrorCode::PaymentIntentNotFound,
                format!("Payment intent {} not found", id),
            )),
        }
    }
}

/// Database row representation of a payment intent.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    amount: i64,
    currency: String,
    provider: String,
    provider_order_id: Option<String>,
    provider_payment_id: Option<String>,
    coupon_id: Option<Uuid>,
    customer_email: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for PaymentIntent {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
        })?;
        let provider = row.provider.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid provider: {}", e))
        })?;

        Ok(PaymentIntent::reconstitute(
            PaymentIntentId::from_uuid(row.id),
            user_id,
            row.amount,
            row.currency,
            provider,
            row.provider_order_id,
            row.provider_payment_id,
            row.coupon_id.map(CouponId::from_uuid),
            row.customer_email,
            parse_status(&row.status)?,
            Timestamp::from_datetime(row.created_at),
            Timestamp::from_datetime(row.updated_at),
        ))
    }
}

fn parse_status(s: &str) -> Result<PaymentStatus, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid payment status value: {}", s),
        )
    })
}

const SELECT_PAYMENT: &str = r#"
    SELECT id, user_id, amount, currency, provider, provider_order_id, provider_payment_id,
           coupon_id, customer_email, status, created_at, updated_at
    FROM payments
"#;

#[async_trait]
impl PaymentIntentRepository for PostgresPaymentIntentRepository {
    async fn create(
        &self,
        intent: &PaymentIntent,
        coupon_usage: Option<&CouponUsage>,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        if let Some(usage) = coupon_usage {
            increment_coupon_usage(&mut tx, usage).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, amount, currency, provider, provider_order_id, provider_payment_id,
                coupon_id, customer_email, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(intent.id().as_uuid())
        .bind(intent.user_id().as_str())
        .bind(intent.amount())
        .bind(intent.currency())
        .bind(intent.provider().as_str())
        .bind(intent.provider_order_id())
        .bind(intent.provider_payment_id())
        .bind(intent.coupon_id().map(|c| *c.as_uuid()))
        .bind(intent.customer_email())
        .bind(intent.status().as_str())
        .bind(intent.created_at().as_datetime())
        .bind(intent.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(db_error("Failed to insert payment intent"))?;

        if let Some(usage) = coupon_usage {
            insert_coupon_usage(&mut tx, usage).await?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit payment intent"))?;
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_PAYMENT))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to fetch payment intent"))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        let row: Option<PaymentRow> =
            sqlx::query_as(&format!("{} WHERE provider_order_id = $1", SELECT_PAYMENT))
                .bind(provider_order_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error("Failed to fetch payment intent by order"))?;

        row.map(PaymentIntent::try_from).transpose()
    }

    async fn find_pending_by_email_since(
        &self,
        email: &str,
        since: Timestamp,
    ) -> Result<Vec<PaymentIntent>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            "{} WHERE status = 'pending' AND lower(customer_email) = lower($1) AND created_at >= $2 ORDER BY created_at",
            SELECT_PAYMENT
        ))
        .bind(email.trim())
        .bind(since.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to search pending payments"))?;

        rows.into_iter().map(PaymentIntent::try_from).collect()
    }

    async fn transition_to_completed(
        &self,
        id: PaymentIntentId,
        provider_payment_id: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed', provider_payment_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .bind(provider_payment_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to complete payment intent"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::AlreadyTerminal(self.current_status(id).await?))
    }

    async fn transition_to_failed(&self, id: PaymentIntentId) -> Result<TransitionOutcome, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payments SET status = 'failed', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to fail payment intent"))?;

        if result.rows_affected() == 1 {
            return Ok(TransitionOutcome::Applied);
        }
        Ok(TransitionOutcome::AlreadyTerminal(self.current_status(id).await?))
    }
}

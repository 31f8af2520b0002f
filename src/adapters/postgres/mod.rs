//! PostgreSQL adapters.
//!
//! Each repository owns a `PgPool` clone and maps sqlx errors to
//! `ErrorCode::DatabaseError` unless a constraint has domain meaning.

mod coupon_repository;
mod enrollment_repository;
mod payment_intent_repository;
mod referral_repository;
mod webhook_event_repository;

pub use coupon_repository::PostgresCouponRepository;
pub use enrollment_repository::PostgresEnrollmentRepository;
pub use payment_intent_repository::PostgresPaymentIntentRepository;
pub use referral_repository::PostgresReferralRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use crate::domain::coupon::CouponUsage;
use crate::domain::foundation::{DomainError, ErrorCode};

const COUPON_USER_CONSTRAINT: &str = "coupon_usage_coupon_user_key";

/// Builds a `map_err` closure that wraps a sqlx error with context.
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(context, e)
}

/// Conditionally bumps the coupon counter inside `tx`.
///
/// The row lock serializes concurrent redemptions and the limit is checked
/// against the locked row.
async fn increment_coupon_usage(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    usage: &CouponUsage,
) -> Result<(), DomainError> {
    let result = sqlx::query(
        r#"
        UPDATE coupons SET usage_count = usage_count + 1
        WHERE id = $1 AND is_active AND (usage_limit IS NULL OR usage_count < usage_limit)
        "#,
    )
    .bind(usage.coupon_id.as_uuid())
    .execute(&mut **tx)
    .await
    .map_err(db_error("Failed to increment coupon usage"))?;

    if result.rows_affected() == 0 {
        return Err(DomainError::new(
            ErrorCode::CouponExhausted,
            "Coupon usage limit reached",
        ));
    }
    Ok(())
}

/// Inserts the usage row inside `tx`; a second row for the same
/// `(coupon, user)` maps to `ErrorCode::DuplicateCouponUsage`.
async fn insert_coupon_usage(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    usage: &CouponUsage,
) -> Result<(), DomainError> {
    sqlx::query(
        r#"
        INSERT INTO coupon_usage (
            id, coupon_id, user_id, payment_id, original_price, discount_applied,
            final_price, used_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(usage.id.as_uuid())
    .bind(usage.coupon_id.as_uuid())
    .bind(usage.user_id.as_str())
    .bind(usage.payment_intent_id.map(|id| *id.as_uuid()))
    .bind(usage.original_price)
    .bind(usage.discount_applied)
    .bind(usage.final_price)
    .bind(usage.used_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.constraint() == Some(COUPON_USER_CONSTRAINT) {
                return DomainError::new(
                    ErrorCode::DuplicateCouponUsage,
                    "Coupon already used by this user",
                );
            }
        }
        DomainError::database("Failed to record coupon usage", e)
    })?;
    Ok(())
}

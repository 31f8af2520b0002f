//! PostgreSQL implementation of CouponRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::coupon::{Coupon, CouponCode, CouponUsage};
use crate::domain::foundation::{
    CouponId, CouponUsageId, DomainError, ErrorCode, PaymentIntentId, Timestamp, UserId,
};
use crate::ports::CouponRepository;

use super::db_error;

pub struct PostgresCouponRepository {
    pool: PgPool,
}

impl PostgresCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    code: String,
    discount_type: String,
    discount_value: i64,
    max_discount: Option<i64>,
    min_purchase_amount: Option<i64>,
    usage_count: i32,
    usage_limit: Option<i32>,
    valid_from: Option<DateTime<Utc>>,
    valid_until: Option<DateTime<Utc>>,
    is_active: bool,
}

impl TryFrom<CouponRow> for Coupon {
    type Error = DomainError;

    fn try_from(row: CouponRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e: crate::domain::foundation::ValidationError| DomainError::new(ErrorCode::DatabaseError, e.to_string());
        Ok(Coupon {
            id: CouponId::from_uuid(row.id),
            code: CouponCode::try_new(&row.code).map_err(corrupt)?,
            discount_type: row.discount_type.parse().map_err(corrupt)?,
            discount_value: row.discount_value,
            max_discount: row.max_discount,
            min_purchase_amount: row.min_purchase_amount,
            usage_count: row.usage_count,
            usage_limit: row.usage_limit,
            valid_from: row.valid_from.map(Timestamp::from_datetime),
            valid_until: row.valid_until.map(Timestamp::from_datetime),
            is_active: row.is_active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UsageRow {
    id: Uuid,
    coupon_id: Uuid,
    user_id: String,
    payment_id: Option<Uuid>,
    original_price: i64,
    discount_applied: i64,
    final_price: i64,
    used_at: DateTime<Utc>,
}

impl TryFrom<UsageRow> for CouponUsage {
    type Error = DomainError;

    fn try_from(row: UsageRow) -> Result<Self, Self::Error> {
        Ok(CouponUsage {
            id: CouponUsageId::from_uuid(row.id),
            coupon_id: CouponId::from_uuid(row.coupon_id),
            user_id: UserId::new(row.user_id)
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, e.to_string()))?,
            payment_intent_id: row.payment_id.map(PaymentIntentId::from_uuid),
            original_price: row.original_price,
            discount_applied: row.discount_applied,
            final_price: row.final_price,
            used_at: Timestamp::from_datetime(row.used_at),
        })
    }
}

#[async_trait]
impl CouponRepository for PostgresCouponRepository {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError> {
        let row: Option<CouponRow> = sqlx::query_as(
            r#"
            SELECT id, code, discount_type, discount_value, max_discount, min_purchase_amount,
                   usage_count, usage_limit, valid_from, valid_until, is_active
            FROM coupons
            WHERE upper(code) = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch coupon"))?;

        row.map(Coupon::try_from).transpose()
    }

    async fn has_user_used(&self, coupon_id: CouponId, user_id: &UserId) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM coupon_usage WHERE coupon_id = $1 AND user_id = $2)",
        )
        .bind(coupon_id.as_uuid())
        .bind(user_id.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check coupon usage"))?;

        Ok(exists)
    }

    async fn find_usage_by_intent(
        &self,
        intent_id: PaymentIntentId,
    ) -> Result<Option<CouponUsage>, DomainError> {
        let row: Option<UsageRow> = sqlx::query_as(
            r#"
            SELECT id, coupon_id, user_id, payment_id, original_price, discount_applied,
                   final_price, used_at
            FROM coupon_usage
            WHERE payment_id = $1
            "#,
        )
        .bind(intent_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch coupon usage"))?;

        row.map(CouponUsage::try_from).transpose()
    }
}

//! PostgreSQL implementation of WebhookEventRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentIntentId, Timestamp};
use crate::domain::webhook::{SaveResult, WebhookEventRecord};
use crate::ports::WebhookEventRepository;

use super::db_error;

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    outcome: String,
    intent_id: Option<Uuid>,
    provider_payment_id: Option<String>,
    note: Option<String>,
    received_at: DateTime<Utc>,
    payload: serde_json::Value,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        Ok(WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            outcome: row
                .outcome
                .parse()
                .map_err(|e| DomainError::new(ErrorCode::DatabaseError, format!("{}", e)))?,
            intent_id: row.intent_id.map(PaymentIntentId::from_uuid),
            provider_payment_id: row.provider_payment_id,
            note: row.note,
            received_at: Timestamp::from_datetime(row.received_at),
            payload: row.payload,
        })
    }
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn save(&self, record: &WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO webhook_events (
                event_id, event_type, outcome, intent_id, provider_payment_id, note,
                received_at, payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(&record.event_id)
        .bind(&record.event_type)
        .bind(record.outcome.as_str())
        .bind(record.intent_id.map(|id| *id.as_uuid()))
        .bind(&record.provider_payment_id)
        .bind(&record.note)
        .bind(record.received_at.as_datetime())
        .bind(&record.payload)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to save webhook event"))?;

        if result.rows_affected() == 0 {
            Ok(SaveResult::AlreadyExists)
        } else {
            Ok(SaveResult::Inserted)
        }
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, outcome, intent_id, provider_payment_id, note,
                   received_at, payload
            FROM webhook_events WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to fetch webhook event"))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn list_needing_review(&self, limit: u32) -> Result<Vec<WebhookEventRecord>, DomainError> {
        let rows: Vec<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, outcome, intent_id, provider_payment_id, note,
                   received_at, payload
            FROM webhook_events
            WHERE outcome IN ('unmatched', 'ambiguous', 'malformed', 'conflict')
            ORDER BY received_at
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list webhook events for review"))?;

        rows.into_iter().map(WebhookEventRecord::try_from).collect()
    }
}

//! Webhook audit log port.

use async_trait::async_trait;

use crate::domain::foundation::DomainError;
use crate::domain::webhook::{SaveResult, WebhookEventRecord};

/// Stores one record per distinct webhook event.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Inserts the record unless one exists for the same event id.
    async fn save(&self, record: &WebhookEventRecord) -> Result<SaveResult, DomainError>;

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Records that need manual reconciliation, oldest first.
    async fn list_needing_review(&self, limit: u32) -> Result<Vec<WebhookEventRecord>, DomainError>;
}

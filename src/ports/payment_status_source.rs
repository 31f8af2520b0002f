//! Read-only payment status port used by the client poller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, PaymentIntentId};
use crate::domain::payment::PaymentStatus;

/// What the client can see about a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusView {
    pub intent_id: PaymentIntentId,
    pub status: PaymentStatus,
    pub enrolled: bool,
}

/// Source of [`PaymentStatusView`]s. Implementations never write.
#[async_trait]
pub trait PaymentStatusSource: Send + Sync {
    async fn fetch_status(&self, intent_id: PaymentIntentId) -> Result<PaymentStatusView, DomainError>;
}

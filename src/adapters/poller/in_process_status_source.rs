//! Status source that calls the query handler directly.

use async_trait::async_trait;

use crate::application::handlers::{GetPaymentStatusHandler, GetPaymentStatusQuery};
use crate::domain::foundation::{DomainError, PaymentIntentId, UserId};
use crate::ports::{PaymentStatusSource, PaymentStatusView};

/// Reads status for one user without going through HTTP.
pub struct InProcessStatusSource {
    handler: GetPaymentStatusHandler,
    user_id: UserId,
}

impl InProcessStatusSource {
    pub fn new(handler: GetPaymentStatusHandler, user_id: UserId) -> Self {
        Self { handler, user_id }
    }
}

#[async_trait]
impl PaymentStatusSource for InProcessStatusSource {
    async fn fetch_status(&self, intent_id: PaymentIntentId) -> Result<PaymentStatusView, DomainError> {
        let query = GetPaymentStatusQuery {
            user_id: self.user_id.clone(),
            intent_id,
        };
        Ok(self.handler.handle(query).await?)
    }
}

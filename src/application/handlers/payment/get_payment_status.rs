//! GetPaymentStatusHandler - Read-only view polled by the client.

use std::sync::Arc;

use crate::domain::foundation::{PaymentIntentId, UserId};
use crate::domain::payment::CheckoutError;
use crate::ports::{EnrollmentRepository, PaymentIntentRepository, PaymentStatusView};

#[derive(Debug, Clone)]
pub struct GetPaymentStatusQuery {
    pub user_id: UserId,
    pub intent_id: PaymentIntentId,
}

/// Reads the intent status and the caller's enrollment flag. Never writes.
pub struct GetPaymentStatusHandler {
    intents: Arc<dyn PaymentIntentRepository>,
    enrollments: Arc<dyn EnrollmentRepository>,
}

impl GetPaymentStatusHandler {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        enrollments: Arc<dyn EnrollmentRepository>,
    ) -> Self {
        Self {
            intents,
            enrollments,
        }
    }

    pub async fn handle(&self, query: GetPaymentStatusQuery) -> Result<PaymentStatusView, CheckoutError> {
        let intent = self
            .intents
            .find_by_id(query.intent_id)
            .await?
            .ok_or_else(|| CheckoutError::intent_not_found(query.intent_id.to_string()))?;
        intent.ensure_owned_by(&query.user_id)?;

        let enrollment = self.enrollments.get(&query.user_id).await?;

        Ok(PaymentStatusView {
            intent_id: intent.id(),
            status: intent.status(),
            enrolled: enrollment.enrolled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCheckoutStore;
    use crate::domain::enrollment::CohortWindow;
    use crate::domain::foundation::Timestamp;
    use crate::domain::payment::{PaymentIntent, PaymentStatus, Provider};

    fn owner() -> UserId {
        UserId::new("owner").unwrap()
    }

    async fn seeded() -> (Arc<InMemoryCheckoutStore>, PaymentIntentId) {
        let store = Arc::new(InMemoryCheckoutStore::new());
        let intent =
            PaymentIntent::new(PaymentIntentId::new(), owner(), 999, "INR", Provider::Razorpay)
                .unwrap();
        store.create(&intent, None).await.unwrap();
        (store, intent.id())
    }

    #[tokio::test]
    async fn reports_pending_and_not_enrolled() {
        let (store, id) = seeded().await;
        let handler = GetPaymentStatusHandler::new(store.clone(), store);

        let view = handler
            .handle(GetPaymentStatusQuery {
                user_id: owner(),
                intent_id: id,
            })
            .await
            .unwrap();

        assert_eq!(view.status, PaymentStatus::Pending);
        assert!(!view.enrolled);
    }

    #[tokio::test]
    async fn reflects_completion_and_enrollment() {
        let (store, id) = seeded().await;
        store.transition_to_completed(id, "pay_1").await.unwrap();
        store
            .open_window(&owner(), CohortWindow::starting_at(Timestamp::now(), 30).unwrap())
            .await
            .unwrap();
        let handler = GetPaymentStatusHandler::new(store.clone(), store);

        let view = handler
            .handle(GetPaymentStatusQuery {
                user_id: owner(),
                intent_id: id,
            })
            .await
            .unwrap();

        assert_eq!(view.status, PaymentStatus::Completed);
        assert!(view.enrolled);
    }

    #[tokio::test]
    async fn hides_other_users_intents() {
        let (store, id) = seeded().await;
        let handler = GetPaymentStatusHandler::new(store.clone(), store);

        let result = handler
            .handle(GetPaymentStatusQuery {
                user_id: UserId::new("someone-else").unwrap(),
                intent_id: id,
            })
            .await;

        assert_eq!(result.unwrap_err(), CheckoutError::Forbidden);
    }
}

//! Mock payment gateway for testing.
//!
//! Supports:
//! - Scripted remote statuses per provider order id
//! - Error injection for create and fetch
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::ports::{
    CreatePaymentRequest, GatewayError, PaymentGateway, PaymentRequestCreated, RemotePaymentStatus,
};

/// Mock gateway whose remote state is set by the test.
///
/// # Example
///
/// ```ignore
/// let gateway = MockGateway::new();
/// let created = gateway.create_payment_request(request).await?;
/// gateway.mark_paid(&created.provider_order_id, "pay_1");
/// ```
#[derive(Default, Clone)]
pub struct MockGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    next_order_seq: u32,
    statuses: HashMap<String, RemotePaymentStatus>,
    created: Vec<CreatePaymentRequest>,
    fetch_calls: Vec<String>,
    create_error: Option<GatewayError>,
    fetch_error: Option<GatewayError>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_status(&self, provider_order_id: &str, status: RemotePaymentStatus) {
        self.state()
            .statuses
            .insert(provider_order_id.to_string(), status);
    }

    pub fn mark_paid(&self, provider_order_id: &str, provider_payment_id: &str) {
        self.set_status(
            provider_order_id,
            RemotePaymentStatus::Paid {
                provider_payment_id: Some(provider_payment_id.to_string()),
            },
        );
    }

    pub fn mark_failed(&self, provider_order_id: &str) {
        self.set_status(
            provider_order_id,
            RemotePaymentStatus::Failed {
                reason: "payment link expired".to_string(),
            },
        );
    }

    /// Every subsequent create fails with `error`.
    pub fn fail_creates_with(&self, error: GatewayError) {
        self.state().create_error = Some(error);
    }

    /// Every subsequent fetch fails with `error`.
    pub fn fail_fetches_with(&self, error: GatewayError) {
        self.state().fetch_error = Some(error);
    }

    pub fn created_requests(&self) -> Vec<CreatePaymentRequest> {
        self.state().created.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.state().fetch_calls.len()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_request(
        &self,
        request: CreatePaymentRequest,
    ) -> Result<PaymentRequestCreated, GatewayError> {
        let mut state = self.state();
        if let Some(err) = state.create_error.clone() {
            return Err(err);
        }
        state.next_order_seq += 1;
        let provider_order_id = format!("plink_mock_{}", state.next_order_seq);
        state
            .statuses
            .insert(provider_order_id.clone(), RemotePaymentStatus::Pending);
        state.created.push(request);
        Ok(PaymentRequestCreated {
            checkout_url: format!("https://pay.example.test/{}", provider_order_id),
            provider_order_id,
        })
    }

    async fn fetch_status(&self, provider_order_id: &str) -> Result<RemotePaymentStatus, GatewayError> {
        let mut state = self.state();
        state.fetch_calls.push(provider_order_id.to_string());
        if let Some(err) = state.fetch_error.clone() {
            return Err(err);
        }
        state
            .statuses
            .get(provider_order_id)
            .cloned()
            .ok_or_else(|| GatewayError::not_found("Payment link"))
    }
}

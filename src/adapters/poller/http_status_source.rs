//! Status source that reads `GET /api/payments/:id/status` over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::adapters::http::USER_ID_HEADER;
use crate::domain::foundation::{DomainError, ErrorCode, PaymentIntentId, UserId};
use crate::ports::{PaymentStatusSource, PaymentStatusView};

/// Reads payment status from a running checkout service.
pub struct HttpStatusSource {
    base_url: String,
    user_id: UserId,
    http_client: reqwest::Client,
}

impl HttpStatusSource {
    pub fn new(base_url: impl Into<String>, user_id: UserId, timeout: Duration) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id,
            http_client,
        })
    }

    fn status_url(&self, intent_id: PaymentIntentId) -> String {
        format!("{}/api/payments/{}/status", self.base_url, intent_id)
    }
}

#[async_trait]
impl PaymentStatusSource for HttpStatusSource {
    async fn fetch_status(&self, intent_id: PaymentIntentId) -> Result<PaymentStatusView, DomainError> {
        let response = self
            .http_client
            .get(self.status_url(intent_id))
            .header(USER_ID_HEADER, self.user_id.as_str())
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Status request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DomainError::new(
                ErrorCode::PaymentIntentNotFound,
                format!("Payment not found: {}", intent_id),
            )),
            StatusCode::FORBIDDEN => Err(DomainError::new(
                ErrorCode::Forbidden,
                "Payment belongs to another user",
            )),
            status if !status.is_success() => Err(DomainError::new(
                ErrorCode::InternalError,
                format!("Status request returned {}", status),
            )),
            _ => response.json::<PaymentStatusView>().await.map_err(|e| {
                DomainError::new(ErrorCode::InternalError, format!("Invalid status body: {}", e))
            }),
        }
    }
}

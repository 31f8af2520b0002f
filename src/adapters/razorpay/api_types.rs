//! Razorpay Payment Links API wire types.
//!
//! Only the fields this service reads or writes are modeled.

use serde::{Deserialize, Serialize};

use crate::ports::RemotePaymentStatus;

/// Body of `POST /v1/payment_links`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePaymentLinkBody {
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub accept_partial: bool,
    /// Our intent id; Razorpay enforces uniqueness, which stops a retried
    /// create from producing two links for one intent.
    pub reference_id: String,
    pub description: String,
    pub customer: LinkCustomer,
    pub notify: LinkNotify,
    pub reminder_enable: bool,
    pub notes: LinkNotes,
    pub callback_url: String,
    pub callback_method: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkCustomer {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkNotify {
    pub sms: bool,
    pub email: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkNotes {
    pub intent_id: String,
}

/// A payment link as returned by create and fetch.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLink {
    pub id: String,
    #[serde(default)]
    pub short_url: String,
    /// `created`, `partially_paid`, `paid`, `expired` or `cancelled`.
    pub status: String,
    #[serde(default)]
    pub amount_paid: Option<i64>,
    #[serde(default)]
    pub payments: Option<Vec<LinkPayment>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkPayment {
    pub payment_id: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl PaymentLink {
    /// Maps the link's lifecycle onto the port's three states.
    ///
    /// `partially_paid` is not paid: partial payments are disabled when
    /// links are created, so seeing it means something is off and the
    /// intent should wait for review rather than unlock.
    pub fn remote_status(&self) -> RemotePaymentStatus {
        match self.status.as_str() {
            "paid" => RemotePaymentStatus::Paid {
                provider_payment_id: self.captured_payment_id(),
            },
            "expired" | "cancelled" => RemotePaymentStatus::Failed {
                reason: format!("payment link {}", self.status),
            },
            _ => RemotePaymentStatus::Pending,
        }
    }

    fn captured_payment_id(&self) -> Option<String> {
        let payments = self.payments.as_ref()?;
        payments
            .iter()
            .find(|p| p.status.as_deref() == Some("captured"))
            .or_else(|| payments.first())
            .map(|p| p.payment_id.clone())
    }
}

/// Error envelope: `{"error": {"code": ..., "description": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

//! Gateway webhook event types.
//!
//! Only the fields needed for correlation are captured; the rest of the
//! gateway's schema is ignored.

use serde::Deserialize;

use crate::domain::foundation::PaymentIntentId;

/// Event types that carry a captured payment and drive reconciliation.
pub const PAYMENT_CAPTURED: &str = "payment.captured";
pub const PAYMENT_LINK_PAID: &str = "payment_link.paid";

/// Notes key under which the intent id is sent to the gateway.
pub const INTENT_ID_NOTE: &str = "intent_id";

/// Webhook envelope: `{event, payload: {payment: {entity: {...}}, payment_link?: ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayEvent {
    pub event: String,

    #[serde(default)]
    pub payload: EventPayload,

    /// Unix seconds at which the gateway emitted the event.
    #[serde(default)]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub payment: Option<EntityWrapper<PaymentEntity>>,

    /// Present on `payment_link.paid`; its id is our provider order id.
    #[serde(default)]
    pub payment_link: Option<EntityWrapper<PaymentLinkEntity>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrapper<T> {
    pub entity: T,
}

/// A payment as described by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentEntity {
    pub id: String,

    /// Minor units (paise).
    pub amount: i64,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub contact: Option<String>,

    /// The gateway's internal order, not the payment link.
    #[serde(default)]
    pub order_id: Option<String>,

    /// Free-form notes. The gateway sends `[]` rather than `{}` when empty,
    /// so this stays untyped.
    #[serde(default)]
    pub notes: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentLinkEntity {
    pub id: String,
}

/// The facts a captured-payment event contributes to correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPayment {
    pub provider_payment_id: String,
    pub amount_minor: i64,
    pub email: Option<String>,
    pub contact: Option<String>,
    /// Our own intent id, when the gateway relayed it back through notes.
    pub intent_id: Option<PaymentIntentId>,
    /// The payment link the payment settled, stored as the intent's
    /// provider order id.
    pub payment_link_id: Option<String>,
}

impl GatewayEvent {
    pub fn is_payment_captured(&self) -> bool {
        self.event == PAYMENT_CAPTURED || self.event == PAYMENT_LINK_PAID
    }

    /// Extracts the captured payment, if this event carries one.
    pub fn captured_payment(&self) -> Option<CapturedPayment> {
        if !self.is_payment_captured() {
            return None;
        }
        let entity = &self.payload.payment.as_ref()?.entity;
        Some(CapturedPayment {
            provider_payment_id: entity.id.clone(),
            amount_minor: entity.amount,
            email: entity.email.clone().filter(|e| !e.trim().is_empty()),
            contact: entity.contact.clone(),
            intent_id: entity.intent_id(),
            payment_link_id: self.payload.payment_link.as_ref().map(|l| l.entity.id.clone()),
        })
    }

    /// Stable key for de-duplicating redeliveries of the same event.
    pub fn dedupe_key(&self) -> String {
        match &self.payload.payment {
            Some(wrapper) => format!("{}:{}", self.event, wrapper.entity.id),
            None => match self.created_at {
                Some(ts) => format!("{}:{}", self.event, ts),
                None => self.event.clone(),
            },
        }
    }
}

impl PaymentEntity {
    fn intent_id(&self) -> Option<PaymentIntentId> {
        self.notes
            .get(INTENT_ID_NOTE)
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

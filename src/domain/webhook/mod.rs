//! Gateway webhook domain: authenticity, event shapes and audit records.

mod errors;
mod event;
mod record;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    CapturedPayment, EntityWrapper, EventPayload, GatewayEvent, PaymentEntity, PaymentLinkEntity,
    INTENT_ID_NOTE, PAYMENT_CAPTURED, PAYMENT_LINK_PAID,
};
pub use record::{SaveResult, WebhookEventRecord, WebhookOutcome};
pub use verifier::{sign_payload, WebhookVerifier};

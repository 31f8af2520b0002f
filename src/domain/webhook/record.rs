//! Audit record of a received webhook.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PaymentIntentId, Timestamp, ValidationError};

/// What ingestion concluded about one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    /// Correlated and this delivery completed the intent.
    Matched,
    /// Correlated, but the intent was already terminal.
    AlreadyCompleted,
    /// Not an event type we act on.
    Ignored,
    /// No candidate intent. Needs manual review.
    Unmatched,
    /// Several candidate intents. Needs manual review.
    Ambiguous,
    /// Signed correctly but could not be parsed.
    Malformed,
    /// Captured payment for an intent that had already failed. Needs
    /// manual review.
    Conflict,
}

impl WebhookOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookOutcome::Matched => "matched",
            WebhookOutcome::AlreadyCompleted => "already_completed",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Unmatched => "unmatched",
            WebhookOutcome::Ambiguous => "ambiguous",
            WebhookOutcome::Malformed => "malformed",
            WebhookOutcome::Conflict => "conflict",
        }
    }

    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            WebhookOutcome::Unmatched
                | WebhookOutcome::Ambiguous
                | WebhookOutcome::Malformed
                | WebhookOutcome::Conflict
        )
    }
}

impl std::str::FromStr for WebhookOutcome {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "matched" => Ok(WebhookOutcome::Matched),
            "already_completed" => Ok(WebhookOutcome::AlreadyCompleted),
            "ignored" => Ok(WebhookOutcome::Ignored),
            "unmatched" => Ok(WebhookOutcome::Unmatched),
            "ambiguous" => Ok(WebhookOutcome::Ambiguous),
            "malformed" => Ok(WebhookOutcome::Malformed),
            "conflict" => Ok(WebhookOutcome::Conflict),
            other => Err(ValidationError::invalid_format(
                "webhook_outcome",
                format!("unknown outcome '{}'", other),
            )),
        }
    }
}

/// Record of a signature-valid webhook delivery.
///
/// Records needing review form the manual reconciliation queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookEventRecord {
    pub event_id: String,
    pub event_type: String,
    pub outcome: WebhookOutcome,
    pub intent_id: Option<PaymentIntentId>,
    pub provider_payment_id: Option<String>,
    pub note: Option<String>,
    pub received_at: Timestamp,
    pub payload: serde_json::Value,
}

impl WebhookEventRecord {
    pub fn new(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        outcome: WebhookOutcome,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            outcome,
            intent_id: None,
            provider_payment_id: None,
            note: None,
            received_at: Timestamp::now(),
            payload,
        }
    }

    pub fn with_intent(mut self, intent_id: PaymentIntentId) -> Self {
        self.intent_id = Some(intent_id);
        self
    }

    pub fn with_payment(mut self, provider_payment_id: impl Into<String>) -> Self {
        self.provider_payment_id = Some(provider_payment_id.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Result of attempting to save a webhook record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveResult {
    /// First record for this event id.
    Inserted,
    /// A record for this event id already exists (redelivery).
    AlreadyExists,
}

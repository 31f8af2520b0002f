//! WebhookIngestor - Authenticates, correlates and records gateway webhooks.
//!
//! The ingestor only finds a candidate intent. Exactly-once completion is
//! the reconciliation engine's job, so redeliveries are safe to process
//! again.

use std::sync::Arc;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::application::handlers::payment::{ConfirmOutcome, ReconciliationEngine, Verification};
use crate::config::EnrollmentConfig;
use crate::domain::foundation::{PaymentIntentId, Timestamp};
use crate::domain::payment::amount_matches;
use crate::domain::webhook::{
    CapturedPayment, GatewayEvent, SaveResult, WebhookError, WebhookEventRecord, WebhookOutcome,
    WebhookVerifier,
};
use crate::ports::{PaymentIntentRepository, WebhookEventRepository};

/// Correlation settings.
#[derive(Debug, Clone)]
pub struct IngestorConfig {
    /// Match by payer email and amount when no identifier is relayed.
    pub heuristic_matching_enabled: bool,
    pub match_window_hours: u32,
    pub amount_tolerance_bps: u32,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            heuristic_matching_enabled: true,
            match_window_hours: 24,
            amount_tolerance_bps: 100,
        }
    }
}

impl From<&EnrollmentConfig> for IngestorConfig {
    fn from(config: &EnrollmentConfig) -> Self {
        Self {
            heuristic_matching_enabled: config.heuristic_matching_enabled,
            match_window_hours: config.match_window_hours,
            amount_tolerance_bps: config.amount_tolerance_bps,
        }
    }
}

/// A raw webhook delivery.
#[derive(Debug, Clone)]
pub struct IngestWebhookCommand {
    /// Exact request body, as signed.
    pub payload: Vec<u8>,
    pub signature: Option<String>,
}

enum Correlation {
    Found(PaymentIntentId),
    Ambiguous(Vec<PaymentIntentId>),
    None,
}

/// Handler for inbound gateway webhooks.
pub struct WebhookIngestor {
    verifier: WebhookVerifier,
    intents: Arc<dyn PaymentIntentRepository>,
    events: Arc<dyn WebhookEventRepository>,
    engine: Arc<ReconciliationEngine>,
    config: IngestorConfig,
}

impl WebhookIngestor {
    pub fn new(
        verifier: WebhookVerifier,
        intents: Arc<dyn PaymentIntentRepository>,
        events: Arc<dyn WebhookEventRepository>,
        engine: Arc<ReconciliationEngine>,
        config: IngestorConfig,
    ) -> Self {
        Self {
            verifier,
            intents,
            events,
            engine,
            config,
        }
    }

    /// Processes one delivery.
    ///
    /// # Errors
    ///
    /// - `MissingSignature` / `InvalidSignature` - the body was not processed
    /// - `Database` - storage failed; the sender should redeliver
    ///
    /// Everything else, including "no matching intent", is an outcome.
    pub async fn handle(&self, cmd: IngestWebhookCommand) -> Result<WebhookOutcome, WebhookError> {
        if let Err(e) = self.verifier.verify(&cmd.payload, cmd.signature.as_deref()) {
            tracing::warn!(error = %e, body_len = cmd.payload.len(), "Rejected webhook with bad signature");
            return Err(e);
        }

        let record = match serde_json::from_slice::<Value>(&cmd.payload) {
            Err(e) => malformed(&cmd.payload, None, e.to_string()),
            Ok(raw) => match serde_json::from_value::<GatewayEvent>(raw.clone()) {
                Err(e) => malformed(&cmd.payload, Some(raw), e.to_string()),
                Ok(event) => self.process(event, raw).await?,
            },
        };

        let outcome = record.outcome;
        if self.events.save(&record).await? == SaveResult::AlreadyExists {
            tracing::debug!(event_id = %record.event_id, outcome = outcome.as_str(), "Redelivered webhook");
        }

        Ok(outcome)
    }

    async fn process(&self, event: GatewayEvent, raw: Value) -> Result<WebhookEventRecord, WebhookError> {
        let event_id = event.dedupe_key();

        if !event.is_payment_captured() {
            tracing::debug!(event_id = %event_id, event = %event.event, "Ignoring webhook event");
            return Ok(WebhookEventRecord::new(
                event_id,
                event.event,
                WebhookOutcome::Ignored,
                raw,
            ));
        }

        let Some(captured) = event.captured_payment() else {
            tracing::error!(event_id = %event_id, "Captured event without a payment entity");
            return Ok(WebhookEventRecord::new(event_id, event.event, WebhookOutcome::Malformed, raw)
                .with_note("payment entity missing"));
        };
        let record = WebhookEventRecord::new(event_id.clone(), event.event.clone(), WebhookOutcome::Unmatched, raw)
            .with_payment(captured.provider_payment_id.clone());

        let intent_id = match self.correlate(&captured).await? {
            Correlation::Found(id) => id,
            Correlation::Ambiguous(ids) => {
                tracing::info!(
                    event_id = %event_id,
                    candidates = ids.len(),
                    "Ambiguous webhook match; queued for manual review"
                );
                let note = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
                return Ok(WebhookEventRecord {
                    outcome: WebhookOutcome::Ambiguous,
                    ..record
                }
                .with_note(format!("candidates: {}", note)));
            }
            Correlation::None => {
                tracing::info!(
                    event_id = %event_id,
                    provider_payment_id = %captured.provider_payment_id,
                    amount_minor = captured.amount_minor,
                    "No intent matches captured payment; queued for manual review"
                );
                return Ok(record.with_note("no matching intent"));
            }
        };

        let record = record.with_intent(intent_id);
        let outcome = match self
            .engine
            .confirm(
                intent_id,
                Some(captured.provider_payment_id.clone()),
                Verification::PreVerified,
            )
            .await
        {
            Ok(ConfirmOutcome::JustCompleted) => WebhookOutcome::Matched,
            Ok(ConfirmOutcome::AlreadyCompleted) => WebhookOutcome::AlreadyCompleted,
            Ok(ConfirmOutcome::Failed) => WebhookOutcome::Conflict,
            Ok(ConfirmOutcome::NotYetPaid) => WebhookOutcome::Unmatched,
            Err(e) if e.is_retryable() => return Err(WebhookError::Database(e.to_string())),
            Err(e) => {
                tracing::warn!(event_id = %event_id, intent_id = %intent_id, error = %e, "Webhook confirmation rejected");
                return Ok(record.with_note(e.to_string()));
            }
        };

        Ok(WebhookEventRecord { outcome, ..record })
    }

    /// Explicit intent id, then payment link id, then the heuristic.
    async fn correlate(&self, captured: &CapturedPayment) -> Result<Correlation, WebhookError> {
        if let Some(id) = captured.intent_id {
            if self.intents.find_by_id(id).await?.is_some() {
                return Ok(Correlation::Found(id));
            }
            tracing::warn!(intent_id = %id, "Webhook names an unknown intent");
        }

        if let Some(link_id) = captured.payment_link_id.as_deref() {
            if let Some(intent) = self.intents.find_by_provider_order_id(link_id).await? {
                return Ok(Correlation::Found(intent.id()));
            }
        }

        if !self.config.heuristic_matching_enabled {
            return Ok(Correlation::None);
        }
        let Some(email) = captured.email.as_deref() else {
            return Ok(Correlation::None);
        };

        let since = Timestamp::now().minus_hours(i64::from(self.config.match_window_hours));
        let candidates: Vec<PaymentIntentId> = self
            .intents
            .find_pending_by_email_since(email, since)
            .await?
            .into_iter()
            .filter(|i| amount_matches(i.amount(), captured.amount_minor, self.config.amount_tolerance_bps))
            .map(|i| i.id())
            .collect();

        Ok(match candidates.as_slice() {
            [] => Correlation::None,
            [only] => {
                tracing::info!(intent_id = %only, "Webhook matched by email and amount");
                Correlation::Found(*only)
            }
            _ => Correlation::Ambiguous(candidates),
        })
    }
}

fn malformed(payload: &[u8], raw: Option<Value>, reason: String) -> WebhookEventRecord {
    let digest = hex::encode(Sha256::digest(payload));
    tracing::error!(digest = %digest, %reason, "Signed webhook could not be parsed");
    let raw = raw.unwrap_or_else(|| Value::String(String::from_utf8_lossy(payload).into_owned()));
    WebhookEventRecord::new(format!("malformed:{}", digest), "unknown", WebhookOutcome::Malformed, raw)
        .with_note(reason)
}

//! ReconciliationEngine - The single path from "paid somewhere" to "completed here".
//!
//! Every confirmation path (redirect callback, webhook, redelivered
//! webhook) funnels through [`ReconciliationEngine::confirm`]. The
//! repository's compare-and-set on `status = 'pending'` is the idempotency
//! boundary: only the caller that wins it runs the enrollment projection.

use std::sync::Arc;

use crate::domain::enrollment::EnrollmentType;
use crate::domain::foundation::{PaymentIntentId, Timestamp};
use crate::domain::payment::{CheckoutError, PaymentIntent, PaymentStatus, TransitionOutcome};
use crate::ports::{PaymentGateway, PaymentIntentRepository, RemotePaymentStatus};

use super::EnrollmentProjector;

/// Whether the gateway must be re-queried before completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Ask the gateway; client-supplied claims are never trusted.
    Required,
    /// The caller already holds a signature-verified capture event.
    PreVerified,
}

/// Result of a confirmation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// This call completed the intent and ran the side effects.
    JustCompleted,
    /// Another caller completed it first. Nothing ran.
    AlreadyCompleted,
    /// The gateway does not report the payment as paid yet, or could not
    /// be reached. The intent stays pending.
    NotYetPaid,
    /// The intent is failed, either now or from before.
    Failed,
}

impl ConfirmOutcome {
    pub fn just_completed(&self) -> bool {
        matches!(self, ConfirmOutcome::JustCompleted)
    }

    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            ConfirmOutcome::JustCompleted | ConfirmOutcome::AlreadyCompleted
        )
    }
}

/// Confirms payment intents exactly once.
pub struct ReconciliationEngine {
    intents: Arc<dyn PaymentIntentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    projector: Arc<EnrollmentProjector>,
}

impl ReconciliationEngine {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        projector: Arc<EnrollmentProjector>,
    ) -> Self {
        Self {
            intents,
            gateway,
            projector,
        }
    }

    /// Confirms `intent_id` as paid.
    ///
    /// `provider_payment_id` is the caller's claim; when verification runs,
    /// the gateway's own payment id wins.
    ///
    /// # Errors
    ///
    /// `IntentNotFound` for unknown intents, `Infrastructure` for storage
    /// failures. Gateway failures are not errors: they yield `NotYetPaid`.
    pub async fn confirm(
        &self,
        intent_id: PaymentIntentId,
        provider_payment_id: Option<String>,
        verification: Verification,
    ) -> Result<ConfirmOutcome, CheckoutError> {
        let intent = self
            .intents
            .find_by_id(intent_id)
            .await?
            .ok_or_else(|| CheckoutError::intent_not_found(intent_id.to_string()))?;

        match intent.status() {
            PaymentStatus::Completed => return Ok(ConfirmOutcome::AlreadyCompleted),
            PaymentStatus::Failed if verification == Verification::Required => {
                return Ok(ConfirmOutcome::Failed)
            }
            _ => {}
        }

        let payment_id = match verification {
            Verification::PreVerified => provider_payment_id,
            Verification::Required => match self.verify_remote(&intent).await? {
                RemoteVerdict::Paid(remote_id) => remote_id.or(provider_payment_id),
                RemoteVerdict::NotYetPaid => return Ok(ConfirmOutcome::NotYetPaid),
                RemoteVerdict::Failed => return self.mark_failed(intent_id).await,
            },
        };

        let payment_id = payment_id
            .or_else(|| intent.provider_order_id().map(str::to_string))
            .unwrap_or_default();

        let outcome = self
            .intents
            .transition_to_completed(intent_id, &payment_id)
            .await?;

        match outcome {
            TransitionOutcome::Applied => {
                tracing::info!(intent_id = %intent_id, provider_payment_id = %payment_id, "Payment completed");
                let report = self
                    .projector
                    .project(intent.user_id(), EnrollmentType::Paid, Timestamp::now())
                    .await;
                if !report.is_complete() {
                    tracing::error!(
                        intent_id = %intent_id,
                        failed_steps = ?report.failed_steps,
                        "Payment completed but enrollment projection was partial"
                    );
                }
                Ok(ConfirmOutcome::JustCompleted)
            }
            TransitionOutcome::AlreadyTerminal(PaymentStatus::Failed) => {
                tracing::warn!(
                    intent_id = %intent_id,
                    provider_payment_id = %payment_id,
                    "Captured payment for an intent that already failed; needs manual review"
                );
                Ok(ConfirmOutcome::Failed)
            }
            TransitionOutcome::AlreadyTerminal(_) => {
                tracing::debug!(intent_id = %intent_id, "Intent already completed");
                Ok(ConfirmOutcome::AlreadyCompleted)
            }
        }
    }

    async fn verify_remote(&self, intent: &PaymentIntent) -> Result<RemoteVerdict, CheckoutError> {
        let Some(provider_order_id) = intent.provider_order_id() else {
            return Err(CheckoutError::invalid_state(
                "no_provider_order",
                "verify payment",
            ));
        };

        match self.gateway.fetch_status(provider_order_id).await {
            Ok(RemotePaymentStatus::Paid { provider_payment_id }) => {
                Ok(RemoteVerdict::Paid(provider_payment_id))
            }
            Ok(RemotePaymentStatus::Pending) => Ok(RemoteVerdict::NotYetPaid),
            Ok(RemotePaymentStatus::Failed { reason }) => {
                tracing::info!(intent_id = %intent.id(), %reason, "Gateway reports payment failed");
                Ok(RemoteVerdict::Failed)
            }
            Err(e) => {
                tracing::warn!(
                    intent_id = %intent.id(),
                    provider_order_id = %provider_order_id,
                    error = %e,
                    "Gateway verification failed; leaving intent pending"
                );
                Ok(RemoteVerdict::NotYetPaid)
            }
        }
    }

    async fn mark_failed(&self, intent_id: PaymentIntentId) -> Result<ConfirmOutcome, CheckoutError> {
        match self.intents.transition_to_failed(intent_id).await? {
            TransitionOutcome::AlreadyTerminal(PaymentStatus::Completed) => {
                Ok(ConfirmOutcome::AlreadyCompleted)
            }
            _ => Ok(ConfirmOutcome::Failed),
        }
    }
}

enum RemoteVerdict {
    Paid(Option<String>),
    NotYetPaid,
    Failed,
}

//! RedirectCallbackHandler - Handles the buyer's return from the gateway.
//!
//! The query string is a claim, not proof. The engine re-queries the
//! gateway before anything is completed.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::foundation::{PaymentIntentId, UserId};
use crate::domain::payment::CheckoutError;
use crate::ports::PaymentIntentRepository;

use super::{ConfirmOutcome, ReconciliationEngine, Verification};

/// Parameters the gateway appends to the callback URL.
#[derive(Debug, Clone)]
pub struct RedirectCallbackQuery {
    pub user_id: UserId,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    /// Status the gateway claimed in the redirect, e.g. `paid`.
    pub reported_status: Option<String>,
}

/// What the client should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackState {
    /// The gateway claimed success but has not confirmed it yet; poll.
    Verifying,
    Success,
    Pending,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectCallbackResult {
    pub intent_id: PaymentIntentId,
    pub state: CallbackState,
}

pub struct RedirectCallbackHandler {
    intents: Arc<dyn PaymentIntentRepository>,
    engine: Arc<ReconciliationEngine>,
}

impl RedirectCallbackHandler {
    pub fn new(intents: Arc<dyn PaymentIntentRepository>, engine: Arc<ReconciliationEngine>) -> Self {
        Self { intents, engine }
    }

    pub async fn handle(&self, query: RedirectCallbackQuery) -> Result<RedirectCallbackResult, CheckoutError> {
        let intent = self
            .intents
            .find_by_provider_order_id(&query.provider_order_id)
            .await?
            .ok_or_else(|| CheckoutError::intent_not_found(query.provider_order_id.clone()))?;
        intent.ensure_owned_by(&query.user_id)?;

        let outcome = self
            .engine
            .confirm(intent.id(), query.provider_payment_id, Verification::Required)
            .await?;

        let claimed_paid = query
            .reported_status
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("paid"))
            .unwrap_or(false);

        let state = match outcome {
            ConfirmOutcome::JustCompleted | ConfirmOutcome::AlreadyCompleted => CallbackState::Success,
            ConfirmOutcome::NotYetPaid if claimed_paid => CallbackState::Verifying,
            ConfirmOutcome::NotYetPaid => CallbackState::Pending,
            ConfirmOutcome::Failed => CallbackState::Failed,
        };

        tracing::debug!(intent_id = %intent.id(), state = ?state, "Redirect callback handled");

        Ok(RedirectCallbackResult {
            intent_id: intent.id(),
            state,
        })
    }
}

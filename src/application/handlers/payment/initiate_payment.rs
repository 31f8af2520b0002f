//! InitiatePaymentHandler - Command handler for starting a course purchase.

use std::sync::Arc;

use crate::application::handlers::coupon::quote_for_user;
use crate::domain::coupon::{CouponQuote, CouponUsage};
use crate::domain::foundation::{PaymentIntentId, Timestamp, UserId};
use crate::domain::payment::{CheckoutError, PaymentIntent, Provider, MAX_PURCHASE_AMOUNT};
use crate::ports::{
    CouponRepository, CreatePaymentRequest, Customer, PaymentGateway, PaymentIntentRepository,
};

/// Command to start a purchase.
#[derive(Debug, Clone)]
pub struct InitiatePaymentCommand {
    pub user_id: UserId,
    /// List price in whole currency units.
    pub amount: i64,
    pub coupon_code: Option<String>,
    pub customer: Customer,
}

/// A pending intent plus where to send the buyer.
#[derive(Debug, Clone)]
pub struct InitiatePaymentResult {
    pub intent: PaymentIntent,
    pub checkout_url: String,
    pub quote: Option<CouponQuote>,
}

/// Static settings for outbound payment requests.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub currency: String,
    pub callback_url: String,
    pub description: String,
}

/// Handler for creating a payment intent and its remote payment request.
///
/// The gateway is called before anything is written. If it fails, no intent
/// exists and no coupon use is consumed. If it succeeds, the intent and its
/// coupon usage are persisted together.
pub struct InitiatePaymentHandler {
    intents: Arc<dyn PaymentIntentRepository>,
    coupons: Arc<dyn CouponRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
}

impl InitiatePaymentHandler {
    pub fn new(
        intents: Arc<dyn PaymentIntentRepository>,
        coupons: Arc<dyn CouponRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            intents,
            coupons,
            gateway,
            settings,
        }
    }

    pub async fn handle(&self, cmd: InitiatePaymentCommand) -> Result<InitiatePaymentResult, CheckoutError> {
        if !(1..=MAX_PURCHASE_AMOUNT).contains(&cmd.amount) {
            return Err(CheckoutError::validation(
                "amount",
                format!("must be between 1 and {}", MAX_PURCHASE_AMOUNT),
            ));
        }
        if cmd.customer.email.trim().is_empty() {
            return Err(CheckoutError::validation("customer.email", "cannot be empty"));
        }

        // 1. Price the purchase
        let quote = match cmd.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => Some(
                quote_for_user(
                    self.coupons.as_ref(),
                    code,
                    &cmd.user_id,
                    cmd.amount,
                    Timestamp::now(),
                )
                .await??,
            ),
            _ => None,
        };
        let final_amount = quote.as_ref().map(|q| q.final_price).unwrap_or(cmd.amount);
        if final_amount == 0 {
            return Err(CheckoutError::validation(
                "amount",
                "fully discounted purchases use free enrollment",
            ));
        }

        // 2. Mint the intent locally, not yet persisted
        let intent_id = PaymentIntentId::new();
        let mut intent = PaymentIntent::new(
            intent_id,
            cmd.user_id.clone(),
            final_amount,
            self.settings.currency.clone(),
            Provider::Razorpay,
        )?
        .with_customer_email(&cmd.customer.email);
        if let Some(q) = &quote {
            intent = intent.with_coupon(q.coupon_id);
        }

        // 3. Create the remote payment request
        let created = self
            .gateway
            .create_payment_request(CreatePaymentRequest {
                intent_id,
                amount: final_amount,
                currency: intent.currency().to_string(),
                customer: cmd.customer,
                description: self.settings.description.clone(),
                callback_url: self.settings.callback_url.clone(),
            })
            .await
            .map_err(|e| {
                tracing::warn!(intent_id = %intent_id, error = %e, "Payment request creation failed");
                CheckoutError::from(e)
            })?;
        intent.attach_provider_order(&created.provider_order_id)?;

        // 4. Persist intent and coupon usage atomically
        let usage = quote
            .as_ref()
            .map(|q| CouponUsage::from_quote(q, cmd.user_id.clone(), intent_id));
        if let Err(e) = self.intents.create(&intent, usage.as_ref()).await {
            tracing::error!(
                intent_id = %intent_id,
                provider_order_id = %created.provider_order_id,
                error = %e,
                "Remote payment request created but intent was not persisted"
            );
            return Err(e.into());
        }

        tracing::info!(
            intent_id = %intent_id,
            user_id = %cmd.user_id,
            amount = final_amount,
            coupon = quote.as_ref().map(|q| q.code.as_str()).unwrap_or("-"),
            "Payment intent created"
        );

        Ok(InitiatePaymentResult {
            intent,
            checkout_url: created.checkout_url,
            quote,
        })
    }
}

//! In-memory checkout store.
//!
//! Implements every storage port over one mutex-guarded state so that the
//! multi-row writes (intent plus coupon usage, referral plus reward) are
//! atomic the same way the Postgres transactions are. Intended for tests
//! and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::coupon::{Coupon, CouponCode, CouponUsage};
use crate::domain::enrollment::{
    CohortWindow, Enrollment, EnrollmentType, Referral, ReferralReward,
};
use crate::domain::foundation::{
    CouponId, DomainError, ErrorCode, PaymentIntentId, Timestamp, UserId,
};
use crate::domain::payment::{PaymentIntent, TransitionOutcome};
use crate::domain::webhook::{SaveResult, WebhookEventRecord};
use crate::ports::{
    CouponRepository, EnrollmentRepository, PaymentIntentRepository, ReferralRepository,
    WebhookEventRepository,
};

#[derive(Default)]
struct State {
    intents: HashMap<PaymentIntentId, PaymentIntent>,
    coupons: HashMap<CouponId, Coupon>,
    coupon_usages: Vec<CouponUsage>,
    enrollments: HashMap<UserId, Enrollment>,
    /// Number of times a window was opened per user.
    window_writes: HashMap<UserId, u32>,
    referrals: Vec<Referral>,
    rewards: Vec<ReferralReward>,
    webhook_events: Vec<WebhookEventRecord>,
}

/// Mutex-backed implementation of the storage ports.
#[derive(Default)]
pub struct InMemoryCheckoutStore {
    state: Mutex<State>,
}

impl InMemoryCheckoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, DomainError> {
        self.state
            .lock()
            .map_err(|_| DomainError::new(ErrorCode::InternalError, "checkout store lock poisoned"))
    }

    // === Seeding ===

    pub fn insert_coupon(&self, coupon: Coupon) -> Result<(), DomainError> {
        self.state()?.coupons.insert(coupon.id, coupon);
        Ok(())
    }

    pub fn insert_referral(&self, referral: Referral) -> Result<(), DomainError> {
        let mut state = self.state()?;
        if state.referrals.iter().any(|r| r.referee_id == referral.referee_id) {
            return Err(DomainError::validation(
                "referee_id",
                "referee already has a referral",
            ));
        }
        state.referrals.push(referral);
        Ok(())
    }

    // === Inspection ===

    pub fn coupon(&self, id: CouponId) -> Result<Option<Coupon>, DomainError> {
        Ok(self.state()?.coupons.get(&id).cloned())
    }

    pub fn coupon_usages(&self) -> Result<Vec<CouponUsage>, DomainError> {
        Ok(self.state()?.coupon_usages.clone())
    }

    /// How many times an enrollment window was written for `user_id`.
    pub fn window_writes(&self, user_id: &UserId) -> Result<u32, DomainError> {
        Ok(self.state()?.window_writes.get(user_id).copied().unwrap_or(0))
    }

    pub fn referral_for(&self, referee_id: &UserId) -> Result<Option<Referral>, DomainError> {
        Ok(self
            .state()?
            .referrals
            .iter()
            .find(|r| &r.referee_id == referee_id)
            .cloned())
    }

    pub fn webhook_events(&self) -> Result<Vec<WebhookEventRecord>, DomainError> {
        Ok(self.state()?.webhook_events.clone())
    }
}

fn intent_not_found(id: PaymentIntentId) -> DomainError {
    DomainError::new(
        ErrorCode::PaymentIntentNotFound,
        format!("Payment intent {} not found", id),
    )
}

/// Records `usage` and bumps the coupon counter, or changes nothing.
fn redeem_coupon(state: &mut State, usage: &CouponUsage) -> Result<(), DomainError> {
    if state
        .coupon_usages
        .iter()
        .any(|u| u.coupon_id == usage.coupon_id && u.user_id == usage.user_id)
    {
        return Err(DomainError::new(
            ErrorCode::DuplicateCouponUsage,
            "coupon already used by this user",
        ));
    }
    let coupon = state
        .coupons
        .get_mut(&usage.coupon_id)
        .ok_or_else(|| DomainError::new(ErrorCode::CouponNotFound, "coupon not found"))?;
    if !coupon.has_remaining_uses() {
        return Err(DomainError::new(
            ErrorCode::CouponExhausted,
            "coupon usage limit reached",
        ));
    }
    coupon.usage_count += 1;
    state.coupon_usages.push(usage.clone());
    Ok(())
}

#[async_trait]
impl PaymentIntentRepository for InMemoryCheckoutStore {
    async fn create(
        &self,
        intent: &PaymentIntent,
        coupon_usage: Option<&CouponUsage>,
    ) -> Result<(), DomainError> {
        let mut state = self.state()?;

        if state.intents.contains_key(&intent.id()) {
            return Err(DomainError::validation("id", "payment intent already exists"));
        }

        if let Some(usage) = coupon_usage {
            redeem_coupon(&mut state, usage)?;
        }

        state.intents.insert(intent.id(), intent.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PaymentIntentId) -> Result<Option<PaymentIntent>, DomainError> {
        Ok(self.state()?.intents.get(&id).cloned())
    }

    async fn find_by_provider_order_id(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<PaymentIntent>, DomainError> {
        Ok(self
            .state()?
            .intents
            .values()
            .find(|i| i.provider_order_id() == Some(provider_order_id))
            .cloned())
    }

    async fn find_pending_by_email_since(
        &self,
        email: &str,
        since: Timestamp,
    ) -> Result<Vec<PaymentIntent>, DomainError> {
        let mut matches: Vec<PaymentIntent> = self
            .state()?
            .intents
            .values()
            .filter(|i| i.is_pending())
            .filter(|i| !i.created_at().is_before(&since))
            .filter(|i| {
                i.customer_email()
                    .map(|e| e.eq_ignore_ascii_case(email.trim()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        matches.sort_by_key(|i| i.created_at());
        Ok(matches)
    }

    async fn transition_to_completed(
        &self,
        id: PaymentIntentId,
        provider_payment_id: &str,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut state = self.state()?;
        let intent = state.intents.get_mut(&id).ok_or_else(|| intent_not_found(id))?;
        Ok(intent.complete(provider_payment_id, Timestamp::now()))
    }

    async fn transition_to_failed(&self, id: PaymentIntentId) -> Result<TransitionOutcome, DomainError> {
        let mut state = self.state()?;
        let intent = state.intents.get_mut(&id).ok_or_else(|| intent_not_found(id))?;
        Ok(intent.fail(Timestamp::now()))
    }
}

#[async_trait]
impl CouponRepository for InMemoryCheckoutStore {
    async fn find_by_code(&self, code: &CouponCode) -> Result<Option<Coupon>, DomainError> {
        Ok(self
            .state()?
            .coupons
            .values()
            .find(|c| &c.code == code)
            .cloned())
    }

    async fn has_user_used(&self, coupon_id: CouponId, user_id: &UserId) -> Result<bool, DomainError> {
        Ok(self
            .state()?
            .coupon_usages
            .iter()
            .any(|u| u.coupon_id == coupon_id && &u.user_id == user_id))
    }

    async fn find_usage_by_intent(
        &self,
        intent_id: PaymentIntentId,
    ) -> Result<Option<CouponUsage>, DomainError> {
        Ok(self
            .state()?
            .coupon_usages
            .iter()
            .find(|u| u.payment_intent_id == Some(intent_id))
            .cloned())
    }
}

#[async_trait]
impl EnrollmentRepository for InMemoryCheckoutStore {
    async fn get(&self, user_id: &UserId) -> Result<Enrollment, DomainError> {
        Ok(self
            .state()?
            .enrollments
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Enrollment::not_enrolled(user_id.clone())))
    }

    async fn open_window(&self, user_id: &UserId, window: CohortWindow) -> Result<(), DomainError> {
        let mut state = self.state()?;
        state.enrollments.insert(
            user_id.clone(),
            Enrollment {
                user_id: user_id.clone(),
                enrolled: true,
                cohort: Some(window),
            },
        );
        *state.window_writes.entry(user_id.clone()).or_insert(0) += 1;
        Ok(())
    }

    async fn enroll_with_coupon(
        &self,
        user_id: &UserId,
        window: CohortWindow,
        usage: &CouponUsage,
    ) -> Result<bool, DomainError> {
        let mut state = self.state()?;

        if state.enrollments.get(user_id).map(|e| e.enrolled).unwrap_or(false) {
            return Ok(false);
        }
        redeem_coupon(&mut state, usage)?;

        state.enrollments.insert(
            user_id.clone(),
            Enrollment {
                user_id: user_id.clone(),
                enrolled: true,
                cohort: Some(window),
            },
        );
        *state.window_writes.entry(user_id.clone()).or_insert(0) += 1;
        Ok(true)
    }
}

#[async_trait]
impl ReferralRepository for InMemoryCheckoutStore {
    async fn find_by_referee(&self, referee_id: &UserId) -> Result<Option<Referral>, DomainError> {
        self.referral_for(referee_id)
    }

    async fn advance_if_pending(
        &self,
        referee_id: &UserId,
        kind: EnrollmentType,
        paid_points: i32,
        at: Timestamp,
    ) -> Result<Option<ReferralReward>, DomainError> {
        let mut state = self.state()?;
        let reward = match state.referrals.iter_mut().find(|r| &r.referee_id == referee_id) {
            Some(referral) => referral.mark_enrolled(kind, paid_points, at),
            None => None,
        };
        if let Some(reward) = &reward {
            state.rewards.push(reward.clone());
        }
        Ok(reward)
    }

    async fn rewards_for_referrer(&self, referrer_id: &UserId) -> Result<Vec<ReferralReward>, DomainError> {
        Ok(self
            .state()?
            .rewards
            .iter()
            .filter(|r| &r.user_id == referrer_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryCheckoutStore {
    async fn save(&self, record: &WebhookEventRecord) -> Result<SaveResult, DomainError> {
        let mut state = self.state()?;
        if state
            .webhook_events
            .iter()
            .any(|r| r.event_id == record.event_id)
        {
            return Ok(SaveResult::AlreadyExists);
        }
        state.webhook_events.push(record.clone());
        Ok(SaveResult::Inserted)
    }

    async fn find_by_event_id(&self, event_id: &str) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self
            .state()?
            .webhook_events
            .iter()
            .find(|r| r.event_id == event_id)
            .cloned())
    }

    async fn list_needing_review(&self, limit: u32) -> Result<Vec<WebhookEventRecord>, DomainError> {
        Ok(self
            .state()?
            .webhook_events
            .iter()
            .filter(|r| r.outcome.needs_review())
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

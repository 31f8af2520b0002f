//! End-to-end checkout scenarios.
//!
//! Every confirmation path (redirect, webhook, client poll) runs against
//! the in-memory store and the mock gateway, wired the way `main` wires
//! the production adapters.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::sync::watch;

use course_checkout::adapters::{
    InMemoryCheckoutStore, InProcessStatusSource, MockGateway, PollOutcome, PollerConfig,
    ReconciliationPoller,
};
use course_checkout::application::handlers::{
    CallbackState, CheckoutSettings, CompleteFreeEnrollmentCommand,
    CompleteFreeEnrollmentHandler, CompleteFreeEnrollmentResult, ConfirmOutcome, CouponValidation, EnrollmentProjector,
    GetPaymentStatusHandler, IngestWebhookCommand, IngestorConfig, InitiatePaymentCommand,
    InitiatePaymentHandler, InitiatePaymentResult, ReconciliationEngine, RedirectCallbackHandler,
    RedirectCallbackQuery, ValidateCouponHandler, ValidateCouponQuery, Verification,
    WebhookIngestor,
};
use course_checkout::domain::coupon::{Coupon, CouponCode, CouponRejection, DiscountType};
use course_checkout::domain::enrollment::{Referral, ReferralStatus};
use course_checkout::domain::foundation::{CouponId, UserId};
use course_checkout::domain::payment::{CheckoutError, PaymentStatus};
use course_checkout::domain::webhook::{sign_payload, WebhookError, WebhookOutcome, WebhookVerifier};
use course_checkout::ports::{
    Customer, EnrollmentRepository, PaymentIntentRepository, ReferralRepository,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

const WEBHOOK_SECRET: &str = "whsec_scenarios";
const COHORT_DAYS: u32 = 21;
const REFERRAL_POINTS: i32 = 100;

struct Harness {
    store: Arc<InMemoryCheckoutStore>,
    gateway: Arc<MockGateway>,
    engine: Arc<ReconciliationEngine>,
    ingestor: WebhookIngestor,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryCheckoutStore::new());
        let gateway = Arc::new(MockGateway::new());
        let projector = Arc::new(EnrollmentProjector::new(
            store.clone(),
            store.clone(),
            COHORT_DAYS,
            REFERRAL_POINTS,
        ));
        let engine = Arc::new(ReconciliationEngine::new(
            store.clone(),
            gateway.clone(),
            projector,
        ));
        let ingestor = WebhookIngestor::new(
            WebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string())),
            store.clone(),
            store.clone(),
            engine.clone(),
            IngestorConfig::default(),
        );

        Self {
            store,
            gateway,
            engine,
            ingestor,
        }
    }

    fn initiate_handler(&self) -> InitiatePaymentHandler {
        InitiatePaymentHandler::new(
            self.store.clone(),
            self.store.clone(),
            self.gateway.clone(),
            CheckoutSettings {
                currency: "INR".to_string(),
                callback_url: "https://courses.test/payment/return".to_string(),
                description: "Course enrollment".to_string(),
            },
        )
    }

    async fn buy(&self, user: &UserId, amount: i64, coupon: Option<&str>) -> Result<InitiatePaymentResult, CheckoutError> {
        self.initiate_handler()
            .handle(InitiatePaymentCommand {
                user_id: user.clone(),
                amount,
                coupon_code: coupon.map(str::to_string),
                customer: Customer {
                    name: "Jane".to_string(),
                    email: "jane@x.com".to_string(),
                    contact: None,
                },
            })
            .await
    }

    async fn deliver(&self, body: Vec<u8>) -> Result<WebhookOutcome, WebhookError> {
        let signature = sign_payload(WEBHOOK_SECRET, &body);
        self.ingestor
            .handle(IngestWebhookCommand {
                payload: body,
                signature: Some(signature),
            })
            .await
    }
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn coupon(code: &str, value: i64, usage_count: i32, usage_limit: i32) -> Coupon {
    Coupon {
        id: CouponId::new(),
        code: CouponCode::try_new(code).unwrap(),
        discount_type: DiscountType::Fixed,
        discount_value: value,
        max_discount: None,
        min_purchase_amount: None,
        usage_count,
        usage_limit: Some(usage_limit),
        valid_from: None,
        valid_until: None,
        is_active: true,
    }
}

/// A `payment.captured` body with no intent id and no order id.
fn captured_webhook(payment_id: &str, amount_minor: i64, email: &str) -> Vec<u8> {
    let body: Value = json!({
        "entity": "event",
        "event": "payment.captured",
        "payload": {
            "payment": {
                "entity": {
                    "id": payment_id,
                    "amount": amount_minor,
                    "currency": "INR",
                    "status": "captured",
                    "email": email,
                    "notes": []
                }
            }
        },
        "created_at": 1_700_000_000
    });
    serde_json::to_vec(&body).unwrap()
}

// =============================================================================
// End-to-End Scenarios
// =============================================================================

#[tokio::test]
async fn paid_purchase_without_coupon_unlocks_cohort() {
    let h = Harness::new();
    let buyer = user("buyer-1");

    let created = h.buy(&buyer, 999, None).await.unwrap();
    let order_id = created.intent.provider_order_id().unwrap().to_string();
    h.gateway.mark_paid(&order_id, "pay_001");

    let outcome = h
        .engine
        .confirm(created.intent.id(), Some("pay_001".to_string()), Verification::Required)
        .await
        .unwrap();

    assert_eq!(outcome, ConfirmOutcome::JustCompleted);
    let intent = h.store.find_by_id(created.intent.id()).await.unwrap().unwrap();
    assert_eq!(intent.status(), PaymentStatus::Completed);

    let enrollment = h.store.get(&buyer).await.unwrap();
    assert!(enrollment.enrolled);
    let window = enrollment.cohort.unwrap();
    assert_eq!(window.end(), window.start().add_days(i64::from(COHORT_DAYS)));
}

#[tokio::test]
async fn fixed_coupon_discounts_intent_and_records_usage() {
    let h = Harness::new();
    let buyer = user("buyer-2");
    h.store.insert_coupon(coupon("LAUNCH500", 500, 0, 100)).unwrap();

    let created = h.buy(&buyer, 999, Some("LAUNCH500")).await.unwrap();

    assert_eq!(created.quote.as_ref().unwrap().final_price, 499);
    assert_eq!(created.intent.amount(), 499);

    let order_id = created.intent.provider_order_id().unwrap().to_string();
    h.gateway.mark_paid(&order_id, "pay_002");
    let outcome = h
        .engine
        .confirm(created.intent.id(), None, Verification::Required)
        .await
        .unwrap();
    assert!(outcome.just_completed());

    let usages = h.store.coupon_usages().unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].discount_applied, 500);
    assert_eq!(usages[0].payment_intent_id, Some(created.intent.id()));
}

#[tokio::test]
async fn webhook_without_identifiers_matches_single_candidate() {
    let h = Harness::new();
    let buyer = user("buyer-3");
    let created = h.buy(&buyer, 999, None).await.unwrap();

    let outcome = h.deliver(captured_webhook("pay_003", 99_900, "jane@x.com")).await.unwrap();

    assert_eq!(outcome, WebhookOutcome::Matched);
    let intent = h.store.find_by_id(created.intent.id()).await.unwrap().unwrap();
    assert_eq!(intent.status(), PaymentStatus::Completed);
    assert_eq!(intent.provider_payment_id(), Some("pay_003"));
    assert!(h.store.get(&buyer).await.unwrap().enrolled);
}

#[tokio::test]
async fn duplicate_webhook_does_not_reset_cohort() {
    let h = Harness::new();
    let buyer = user("buyer-4");
    h.buy(&buyer, 999, None).await.unwrap();
    let body = captured_webhook("pay_004", 99_900, "jane@x.com");

    let first = h.deliver(body.clone()).await.unwrap();
    let window_after_first = h.store.get(&buyer).await.unwrap().cohort;
    let second = h.deliver(body).await.unwrap();

    assert_eq!(first, WebhookOutcome::Matched);
    assert_eq!(second, WebhookOutcome::AlreadyCompleted);
    assert_eq!(h.store.window_writes(&buyer).unwrap(), 1);
    assert_eq!(h.store.get(&buyer).await.unwrap().cohort, window_after_first);
}

#[tokio::test]
async fn unverified_redirect_waits_for_webhook_and_poller_sees_it() {
    let h = Harness::new();
    let buyer = user("buyer-5");
    let created = h.buy(&buyer, 999, None).await.unwrap();
    let intent_id = created.intent.id();
    let order_id = created.intent.provider_order_id().unwrap().to_string();

    // Gateway has not propagated the capture yet.
    let callback = RedirectCallbackHandler::new(h.store.clone(), h.engine.clone())
        .handle(RedirectCallbackQuery {
            user_id: buyer.clone(),
            provider_order_id: order_id,
            provider_payment_id: Some("pay_005".to_string()),
            reported_status: Some("paid".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(callback.state, CallbackState::Verifying);
    assert!(h.store.find_by_id(intent_id).await.unwrap().unwrap().is_pending());

    let source = Arc::new(InProcessStatusSource::new(
        GetPaymentStatusHandler::new(h.store.clone(), h.store.clone()),
        buyer.clone(),
    ));
    let poller = ReconciliationPoller::new(
        source,
        PollerConfig::default()
            .with_max_attempts(200)
            .with_interval(Duration::from_millis(5)),
    );
    let (_cancel_tx, cancel_rx) = watch::channel(false);
    let polling = tokio::spawn(async move { poller.poll(intent_id, cancel_rx).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    let outcome = h.deliver(captured_webhook("pay_005", 99_900, "jane@x.com")).await.unwrap();
    assert_eq!(outcome, WebhookOutcome::Matched);

    let polled = tokio::time::timeout(Duration::from_secs(10), polling)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(polled, PollOutcome::Enrolled);
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn concurrent_confirmations_complete_exactly_once() {
    let h = Harness::new();
    let buyer = user("referee");
    let referrer = user("referrer");
    h.store
        .insert_referral(Referral::pending(referrer.clone(), buyer.clone(), "REF-1"))
        .unwrap();
    let created = h.buy(&buyer, 999, None).await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..16 {
        let engine = h.engine.clone();
        let intent_id = created.intent.id();
        tasks.push(tokio::spawn(async move {
            engine
                .confirm(intent_id, Some(format!("pay_{}", n)), Verification::PreVerified)
                .await
        }));
    }

    let mut just_completed = 0;
    for task in tasks {
        if task.await.unwrap().unwrap().just_completed() {
            just_completed += 1;
        }
    }

    assert_eq!(just_completed, 1);
    assert_eq!(h.store.window_writes(&buyer).unwrap(), 1);
    assert_eq!(h.store.rewards_for_referrer(&referrer).await.unwrap().len(), 1);
}

#[tokio::test]
async fn redirect_claim_is_not_trusted_without_gateway() {
    let h = Harness::new();
    let buyer = user("buyer-6");
    let created = h.buy(&buyer, 999, None).await.unwrap();

    let outcome = h
        .engine
        .confirm(created.intent.id(), Some("pay_fake".to_string()), Verification::Required)
        .await
        .unwrap();

    assert_eq!(outcome, ConfirmOutcome::NotYetPaid);
    assert!(h.store.find_by_id(created.intent.id()).await.unwrap().unwrap().is_pending());
    assert!(!h.store.get(&buyer).await.unwrap().enrolled);
}

#[tokio::test]
async fn tampered_webhook_is_rejected_without_state_change() {
    let h = Harness::new();
    let buyer = user("buyer-7");
    let created = h.buy(&buyer, 999, None).await.unwrap();
    let genuine = captured_webhook("pay_007", 99_900, "jane@x.com");
    let signature = sign_payload(WEBHOOK_SECRET, &genuine);
    let tampered = captured_webhook("pay_007", 100, "jane@x.com");

    let result = h
        .ingestor
        .handle(IngestWebhookCommand {
            payload: tampered,
            signature: Some(signature),
        })
        .await;

    assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    assert_eq!(result.unwrap_err().status_code(), axum::http::StatusCode::UNAUTHORIZED);
    assert!(h.store.find_by_id(created.intent.id()).await.unwrap().unwrap().is_pending());
    assert!(h.store.webhook_events().unwrap().is_empty());
}

#[tokio::test]
async fn exhausted_coupon_is_always_invalid() {
    let h = Harness::new();
    h.store.insert_coupon(coupon("ONLYONE", 100, 1, 1)).unwrap();

    let mut tasks = Vec::new();
    for n in 0..8 {
        let validator = ValidateCouponHandler::new(h.store.clone());
        tasks.push(tokio::spawn(async move {
            validator
                .handle(ValidateCouponQuery {
                    code: "onlyone".to_string(),
                    user_id: user(&format!("shopper-{}", n)),
                    amount: 999,
                })
                .await
        }));
    }
    for task in tasks {
        let validation = task.await.unwrap().unwrap();
        assert_eq!(validation, CouponValidation::Invalid(CouponRejection::Exhausted));
    }

    let purchase = h.buy(&user("shopper-x"), 999, Some("ONLYONE")).await;
    assert!(matches!(
        purchase,
        Err(CheckoutError::CouponRejected(CouponRejection::Exhausted))
    ));
    assert!(h.gateway.created_requests().is_empty());
}

#[tokio::test]
async fn referral_is_rewarded_once_despite_duplicate_webhook() {
    let h = Harness::new();
    let referee = user("referee-2");
    let referrer = user("referrer-2");
    h.store
        .insert_referral(Referral::pending(referrer.clone(), referee.clone(), "REF-2"))
        .unwrap();
    h.buy(&referee, 999, None).await.unwrap();
    let body = captured_webhook("pay_008", 99_900, "jane@x.com");

    h.deliver(body.clone()).await.unwrap();
    h.deliver(body).await.unwrap();

    let referral = h.store.find_by_referee(&referee).await.unwrap().unwrap();
    assert_eq!(referral.status, ReferralStatus::EnrolledPaid);
    let rewards = h.store.rewards_for_referrer(&referrer).await.unwrap();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].points_earned, REFERRAL_POINTS);
}

#[tokio::test]
async fn scholarship_coupon_is_consumed_by_free_enrollment() {
    let h = Harness::new();
    let scholarship = coupon("SCHOLAR", 999, 0, 1);
    h.store.insert_coupon(scholarship.clone()).unwrap();
    let projector = Arc::new(EnrollmentProjector::new(
        h.store.clone(),
        h.store.clone(),
        COHORT_DAYS,
        REFERRAL_POINTS,
    ));
    let free = CompleteFreeEnrollmentHandler::new(h.store.clone(), h.store.clone(), projector);

    let first = free
        .handle(CompleteFreeEnrollmentCommand {
            user_id: user("scholar-1"),
            coupon_code: "scholar".to_string(),
            amount: 999,
        })
        .await
        .unwrap();
    let second = free
        .handle(CompleteFreeEnrollmentCommand {
            user_id: user("scholar-2"),
            coupon_code: "SCHOLAR".to_string(),
            amount: 999,
        })
        .await;
    let paid = h.buy(&user("scholar-3"), 1_999, Some("SCHOLAR")).await;

    assert!(matches!(first, CompleteFreeEnrollmentResult::Enrolled { .. }));
    assert_eq!(
        second.unwrap_err(),
        CheckoutError::CouponRejected(CouponRejection::Exhausted)
    );
    assert_eq!(
        paid.unwrap_err(),
        CheckoutError::CouponRejected(CouponRejection::Exhausted)
    );
    assert!(!h.store.get(&user("scholar-2")).await.unwrap().enrolled);
    assert_eq!(h.store.coupon(scholarship.id).unwrap().unwrap().usage_count, 1);
    assert!(h.gateway.created_requests().is_empty());
}

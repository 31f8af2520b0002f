//! Checkout service entry point.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use course_checkout::adapters::http::{app_router, CheckoutAppState};
use course_checkout::adapters::{
    PostgresCouponRepository, PostgresEnrollmentRepository, PostgresPaymentIntentRepository,
    PostgresReferralRepository, PostgresWebhookEventRepository, RazorpayConfig, RazorpayGateway,
};
use course_checkout::application::handlers::{
    CheckoutSettings, EnrollmentProjector, IngestorConfig, ReconciliationEngine, WebhookIngestor,
};
use course_checkout::config::AppConfig;
use course_checkout::domain::webhook::WebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let pool = config
        .database
        .pool_options()
        .connect(config.database.connection_url())
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let intents = Arc::new(PostgresPaymentIntentRepository::new(pool.clone()));
    let coupons = Arc::new(PostgresCouponRepository::new(pool.clone()));
    let enrollments = Arc::new(PostgresEnrollmentRepository::new(pool.clone()));
    let referrals = Arc::new(PostgresReferralRepository::new(pool.clone()));
    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool));

    let gateway = Arc::new(RazorpayGateway::new(
        RazorpayConfig::new(config.payment.key_id.clone(), config.payment.key_secret.clone())
            .with_base_url(config.payment.api_base_url.clone())
            .with_timeout(config.payment.request_timeout()),
    )?);

    let projector = Arc::new(EnrollmentProjector::new(
        enrollments.clone(),
        referrals,
        config.enrollment.cohort_length_days,
        config.enrollment.referral_paid_points,
    ));
    let engine = Arc::new(ReconciliationEngine::new(
        intents.clone(),
        gateway.clone(),
        projector.clone(),
    ));
    let ingestor = Arc::new(WebhookIngestor::new(
        WebhookVerifier::new(config.payment.webhook_secret.clone()),
        intents.clone(),
        webhook_events,
        engine.clone(),
        IngestorConfig::from(&config.enrollment),
    ));

    let state = CheckoutAppState {
        intents,
        coupons,
        enrollments,
        gateway,
        projector,
        engine,
        ingestor,
        settings: CheckoutSettings {
            currency: config.payment.currency.clone(),
            callback_url: config.payment.callback_url.clone(),
            description: "Course enrollment".to_string(),
        },
    };

    let app = app_router(state, &config.server);
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "Checkout service listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Checkout service stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().pretty().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid socket address: {0}")]
    InvalidSocketAddr(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Razorpay key id format")]
    InvalidRazorpayKey,

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Callback URL must use HTTPS in production")]
    CallbackMustBeHttps,

    #[error("Currency must be a three-letter ISO code")]
    InvalidCurrency,

    #[error("Cohort length must be between 1 and 365 days")]
    InvalidCohortLength,

    #[error("Amount tolerance must be at most 10000 basis points")]
    InvalidTolerance,

    #[error("Match window must be between 1 and 168 hours")]
    InvalidMatchWindow,

    #[error("Poller needs at least one attempt and a non-zero interval")]
    InvalidPollerSettings,
}

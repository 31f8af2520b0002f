//! Enrollment and reconciliation configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Settings for cohort windows, webhook correlation and the client poller.
#[derive(Debug, Clone, Deserialize)]
pub struct EnrollmentConfig {
    /// Length of a cohort window in days. No default: deployments must
    /// choose one.
    pub cohort_length_days: u32,

    /// Fall back to email/amount/time matching when a webhook carries no
    /// intent id.
    #[serde(default = "default_true")]
    pub heuristic_matching_enabled: bool,

    /// How far back the heuristic looks for pending intents.
    #[serde(default = "default_match_window_hours")]
    pub match_window_hours: u32,

    /// Allowed difference between intent and captured amounts.
    #[serde(default = "default_amount_tolerance_bps")]
    pub amount_tolerance_bps: u32,

    /// Points credited to a referrer when the referee pays.
    #[serde(default = "default_referral_paid_points")]
    pub referral_paid_points: i32,

    #[serde(default = "default_poller_max_attempts")]
    pub poller_max_attempts: u32,

    #[serde(default = "default_poller_interval_ms")]
    pub poller_interval_ms: u64,
}

impl EnrollmentConfig {
    /// Config with defaults for everything except the cohort length.
    pub fn with_cohort_length(cohort_length_days: u32) -> Self {
        Self {
            cohort_length_days,
            heuristic_matching_enabled: default_true(),
            match_window_hours: default_match_window_hours(),
            amount_tolerance_bps: default_amount_tolerance_bps(),
            referral_paid_points: default_referral_paid_points(),
            poller_max_attempts: default_poller_max_attempts(),
            poller_interval_ms: default_poller_interval_ms(),
        }
    }

    pub fn poller_interval(&self) -> Duration {
        Duration::from_millis(self.poller_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=365).contains(&self.cohort_length_days) {
            return Err(ValidationError::InvalidCohortLength);
        }
        if !(1..=168).contains(&self.match_window_hours) {
            return Err(ValidationError::InvalidMatchWindow);
        }
        if self.amount_tolerance_bps > 10_000 {
            return Err(ValidationError::InvalidTolerance);
        }
        if self.poller_max_attempts == 0 || self.poller_interval_ms == 0 {
            return Err(ValidationError::InvalidPollerSettings);
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_match_window_hours() -> u32 {
    24
}

fn default_amount_tolerance_bps() -> u32 {
    100
}

fn default_referral_paid_points() -> i32 {
    100
}

fn default_poller_max_attempts() -> u32 {
    20
}

fn default_poller_interval_ms() -> u64 {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EnrollmentConfig::with_cohort_length(56);
        assert!(config.heuristic_matching_enabled);
        assert_eq!(config.match_window_hours, 24);
        assert_eq!(config.amount_tolerance_bps, 100);
        assert_eq!(config.poller_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cohort_length_bounds() {
        assert_eq!(
            EnrollmentConfig::with_cohort_length(0).validate(),
            Err(ValidationError::InvalidCohortLength)
        );
        assert_eq!(
            EnrollmentConfig::with_cohort_length(366).validate(),
            Err(ValidationError::InvalidCohortLength)
        );
        assert!(EnrollmentConfig::with_cohort_length(365).validate().is_ok());
    }

    #[test]
    fn test_tolerance_above_full_amount_is_rejected() {
        let mut config = EnrollmentConfig::with_cohort_length(30);
        config.amount_tolerance_bps = 10_001;
        assert_eq!(config.validate(), Err(ValidationError::InvalidTolerance));
    }

    #[test]
    fn test_poller_needs_attempts() {
        let mut config = EnrollmentConfig::with_cohort_length(30);
        config.poller_max_attempts = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPollerSettings));
    }
}

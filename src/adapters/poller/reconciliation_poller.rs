//! ReconciliationPoller - Client-side fallback that waits for enrollment.
//!
//! Used when neither the redirect nor the webhook has resolved a purchase
//! the client is waiting on. It only reads status; completion is always
//! decided server-side.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `max_attempts` | 20 | Status reads before giving up |
//! | `interval` | 2s | Delay between reads |

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::config::EnrollmentConfig;
use crate::domain::foundation::PaymentIntentId;
use crate::domain::payment::PaymentStatus;
use crate::ports::PaymentStatusSource;

/// Configuration for the ReconciliationPoller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(2),
        }
    }
}

impl PollerConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl From<&EnrollmentConfig> for PollerConfig {
    fn from(config: &EnrollmentConfig) -> Self {
        Self {
            max_attempts: config.poller_max_attempts,
            interval: config.poller_interval(),
        }
    }
}

/// How a polling session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The user's enrollment flag is set.
    Enrolled,
    /// The intent reached `failed`.
    Failed,
    /// Attempts ran out. The purchase may still complete later.
    StillPending,
    /// The caller stopped polling.
    Cancelled,
}

/// Polls a [`PaymentStatusSource`] until the purchase resolves.
pub struct ReconciliationPoller {
    source: Arc<dyn PaymentStatusSource>,
    config: PollerConfig,
}

impl ReconciliationPoller {
    pub fn new(source: Arc<dyn PaymentStatusSource>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Polls until enrolled, failed, out of attempts or cancelled.
    ///
    /// Sending `true` on the watch channel stops the session before the
    /// next read. Read errors count as an attempt and are not fatal.
    pub async fn poll(&self, intent_id: PaymentIntentId, mut cancel: watch::Receiver<bool>) -> PollOutcome {
        for attempt in 1..=self.config.max_attempts {
            if *cancel.borrow() {
                return PollOutcome::Cancelled;
            }

            match self.source.fetch_status(intent_id).await {
                Ok(view) if view.enrolled => {
                    tracing::debug!(intent_id = %intent_id, attempt, "Enrollment observed");
                    return PollOutcome::Enrolled;
                }
                Ok(view) if view.status == PaymentStatus::Failed => {
                    tracing::debug!(intent_id = %intent_id, attempt, "Payment failed");
                    return PollOutcome::Failed;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(intent_id = %intent_id, attempt, error = %e, "Status read failed");
                }
            }

            if attempt == self.config.max_attempts {
                break;
            }

            tokio::select! {
                changed = cancel.changed() => match changed {
                    Ok(()) if *cancel.borrow() => return PollOutcome::Cancelled,
                    Ok(()) => {}
                    // Sender gone; nobody can cancel any more.
                    Err(_) => time::sleep(self.config.interval).await,
                },
                _ = time::sleep(self.config.interval) => {}
            }
        }

        tracing::info!(
            intent_id = %intent_id,
            attempts = self.config.max_attempts,
            "Payment still pending after polling"
        );
        PollOutcome::StillPending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::domain::foundation::DomainError;
    use crate::ports::PaymentStatusView;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    /// Replays scripted responses, repeating the last one.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<(PaymentStatus, bool), DomainError>>>,
        reads: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<(PaymentStatus, bool), DomainError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                reads: Mutex::new(0),
            }
        }

        fn reads(&self) -> u32 {
            *self.reads.lock().unwrap()
        }
    }

    #[async_trait]
    impl PaymentStatusSource for ScriptedSource {
        async fn fetch_status(&self, intent_id: PaymentIntentId) -> Result<PaymentStatusView, DomainError> {
            *self.reads.lock().unwrap() += 1;
            let mut script = self.script.lock().unwrap();
            let next = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().cloned()
            };
            let (status, enrolled) = next.unwrap_or(Ok((PaymentStatus::Pending, false)))?;
            Ok(PaymentStatusView {
                intent_id,
                status,
                enrolled,
            })
        }
    }

    fn fast_config(attempts: u32) -> PollerConfig {
        PollerConfig::default()
            .with_max_attempts(attempts)
            .with_interval(Duration::from_millis(1))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn stops_once_enrollment_is_visible() {
        let source = Arc::new(ScriptedSource::new(vec![
            Ok((PaymentStatus::Pending, false)),
            Ok((PaymentStatus::Pending, false)),
            Ok((PaymentStatus::Completed, true)),
        ]));
        let poller = ReconciliationPoller::new(source.clone(), fast_config(20));
        let (_tx, rx) = watch::channel(false);

        let outcome = poller.poll(PaymentIntentId::new(), rx).await;

        assert_eq!(outcome, PollOutcome::Enrolled);
        assert_eq!(source.reads(), 3);
    }

    #[tokio::test]
    async fn failed_intent_ends_polling() {
        let source = Arc::new(ScriptedSource::new(vec![Ok((PaymentStatus::Failed, false))]));
        let poller = ReconciliationPoller::new(source.clone(), fast_config(20));
        let (_tx, rx) = watch::channel(false);

        assert_eq!(poller.poll(PaymentIntentId::new(), rx).await, PollOutcome::Failed);
        assert_eq!(source.reads(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let source = Arc::new(ScriptedSource::new(vec![Ok((PaymentStatus::Pending, false))]));
        let poller = ReconciliationPoller::new(source.clone(), fast_config(5));
        let (_tx, rx) = watch::channel(false);

        assert_eq!(poller.poll(PaymentIntentId::new(), rx).await, PollOutcome::StillPending);
        assert_eq!(source.reads(), 5);
    }

    #[tokio::test]
    async fn read_errors_are_retried() {
        let source = Arc::new(ScriptedSource::new(vec![
            Err(DomainError::database("read status", "timeout")),
            Ok((PaymentStatus::Completed, true)),
        ]));
        let poller = ReconciliationPoller::new(source, fast_config(5));
        let (_tx, rx) = watch::channel(false);

        assert_eq!(poller.poll(PaymentIntentId::new(), rx).await, PollOutcome::Enrolled);
    }

    #[tokio::test]
    async fn cancellation_before_start_skips_reads() {
        let source = Arc::new(ScriptedSource::new(vec![Ok((PaymentStatus::Pending, false))]));
        let poller = ReconciliationPoller::new(source.clone(), fast_config(5));
        let (_tx, rx) = watch::channel(true);

        assert_eq!(poller.poll(PaymentIntentId::new(), rx).await, PollOutcome::Cancelled);
        assert_eq!(source.reads(), 0);
    }

    #[tokio::test]
    async fn cancellation_interrupts_the_wait() {
        let source = Arc::new(ScriptedSource::new(vec![Ok((PaymentStatus::Pending, false))]));
        let config = PollerConfig::default()
            .with_max_attempts(100)
            .with_interval(Duration::from_secs(60));
        let poller = ReconciliationPoller::new(source.clone(), config);
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { poller.poll(PaymentIntentId::new(), rx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(source.reads(), 1);
    }

    #[test]
    fn config_follows_enrollment_settings() {
        let enrollment = EnrollmentConfig::with_cohort_length(30);
        let config = PollerConfig::from(&enrollment);
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.interval, Duration::from_millis(2000));
    }
}

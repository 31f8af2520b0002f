//! Payment gateway configuration (Razorpay)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Payment configuration (Razorpay payment links)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Razorpay key id (`rzp_test_...` or `rzp_live_...`)
    pub key_id: String,

    /// Razorpay key secret, used for Basic auth
    pub key_secret: SecretString,

    /// Secret shared with the gateway for webhook signatures
    pub webhook_secret: SecretString,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Where the gateway redirects the buyer after checkout
    pub callback_url: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate payment configuration
    ///
    /// Live keys additionally require an HTTPS callback.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__KEY_ID"));
        }
        if self.key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__KEY_SECRET"));
        }
        if self.webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"));
        }
        if !self.key_id.starts_with("rzp_") {
            return Err(ValidationError::InvalidRazorpayKey);
        }
        if !is_http_url(&self.api_base_url) {
            return Err(ValidationError::InvalidUrl("PAYMENT__API_BASE_URL"));
        }
        if !is_http_url(&self.callback_url) {
            return Err(ValidationError::InvalidUrl("PAYMENT__CALLBACK_URL"));
        }
        if self.is_live_mode() && !self.callback_url.starts_with("https://") {
            return Err(ValidationError::CallbackMustBeHttps);
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn default_api_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> PaymentConfig {
        PaymentConfig {
            key_id: "rzp_test_abc123".to_string(),
            key_secret: SecretString::new("key-secret".to_string()),
            webhook_secret: SecretString::new("hook-secret".to_string()),
            api_base_url: default_api_base_url(),
            callback_url: "http://localhost:5173/payment/callback".to_string(),
            currency: default_currency(),
            request_timeout_secs: default_request_timeout(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
        assert!(valid().is_test_mode());
        assert!(!valid().is_live_mode());
    }

    #[test]
    fn test_missing_secrets_are_rejected() {
        let mut config = valid();
        config.webhook_secret = SecretString::new(String::new());
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("PAYMENT__WEBHOOK_SECRET"))
        );
    }

    #[test]
    fn test_key_prefix_is_checked() {
        let mut config = valid();
        config.key_id = "sk_test_xxx".to_string();
        assert_eq!(config.validate(), Err(ValidationError::InvalidRazorpayKey));
    }

    #[test]
    fn test_live_mode_requires_https_callback() {
        let mut config = valid();
        config.key_id = "rzp_live_abc".to_string();
        assert_eq!(config.validate(), Err(ValidationError::CallbackMustBeHttps));

        config.callback_url = "https://courses.example.com/payment/callback".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_currency_must_be_iso_code() {
        let mut config = valid();
        config.currency = "rupees".to_string();
        assert_eq!(config.validate(), Err(ValidationError::InvalidCurrency));
    }

    #[test]
    fn test_timeout_duration() {
        assert_eq!(valid().request_timeout(), Duration::from_secs(10));
    }
}
